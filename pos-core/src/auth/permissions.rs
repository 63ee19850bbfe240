//! Permission Definitions
//!
//! Fixed role → permission table. The identity provider only asserts the
//! caller's role; every privileged call is checked here.
//!
//! ## 角色
//! - admin: 全部权限
//! - cashier: 收银、班次、订单编辑、报表
//! - kitchen: 仅推进制作状态 (NEW → PREPARING → READY)
//! - customer: 只能为自己下外卖/自取单，管理自己的购物车

use shared::models::Role;

pub const MENU_MANAGE: &str = "menu:manage"; // 菜单管理（商品/分类）
pub const TABLES_MANAGE: &str = "tables:manage"; // 桌台停用/启用
pub const SETTINGS_MANAGE: &str = "settings:manage"; // 店铺设置
pub const SESSIONS_MANAGE: &str = "sessions:manage"; // 开/关收银班次
pub const REPORTS_VIEW: &str = "reports:view"; // 报表查看

pub const ORDERS_CREATE: &str = "orders:create";
pub const ORDERS_EDIT: &str = "orders:edit"; // 加菜、改数量、顾客信息、运费/折扣
pub const ORDERS_ADVANCE: &str = "orders:advance";
pub const ORDERS_SETTLE: &str = "orders:settle";
pub const ORDERS_CANCEL: &str = "orders:cancel";
pub const ORDERS_DELIVER: &str = "orders:deliver";

const CASHIER_PERMISSIONS: &[&str] = &[
    SESSIONS_MANAGE,
    REPORTS_VIEW,
    ORDERS_CREATE,
    ORDERS_EDIT,
    ORDERS_ADVANCE,
    ORDERS_SETTLE,
    ORDERS_CANCEL,
    ORDERS_DELIVER,
];

const KITCHEN_PERMISSIONS: &[&str] = &[ORDERS_ADVANCE];

const CUSTOMER_PERMISSIONS: &[&str] = &[ORDERS_CREATE];

/// Permissions granted to a role
pub fn role_permissions(role: Role) -> &'static [&'static str] {
    match role {
        // admin 拥有全部权限，has_permission 里短路
        Role::Admin => &[],
        Role::Cashier => CASHIER_PERMISSIONS,
        Role::Kitchen => KITCHEN_PERMISSIONS,
        Role::Customer => CUSTOMER_PERMISSIONS,
    }
}

pub fn has_permission(role: Role, permission: &str) -> bool {
    role == Role::Admin || role_permissions(role).contains(&permission)
}
