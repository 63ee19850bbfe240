//! 初始菜单

use rust_decimal::Decimal;
use shared::models::{Category, OptionGroup, Product};

const PASTEIS_CARNE: &str = "Pasteis de Carne";
const PASTEIS_FRANGO: &str = "Pasteis de Frango";
const PASTEIS_ESPECIAIS: &str = "Pasteis Especiais";
const BEBIDAS: &str = "Bebidas";

pub(super) fn categories() -> Vec<Category> {
    [PASTEIS_CARNE, PASTEIS_FRANGO, PASTEIS_ESPECIAIS, BEBIDAS]
        .into_iter()
        .enumerate()
        .map(|(i, name)| Category {
            id: format!("cat-{}", i + 1),
            name: name.to_string(),
            display_order: i as i32 + 1,
        })
        .collect()
}

#[rustfmt::skip]
pub(super) fn products() -> Vec<Product> {
    vec![
        pastel("pastel-carne", "Pastel de Carne", PASTEIS_CARNE, 1250, 1, &["carne moida", "cebola", "azeitona"]),
        pastel("carne-queijo", "Carne com Queijo", PASTEIS_CARNE, 1350, 2, &["carne moida", "mussarela"]),
        pastel("pastel-frango", "Pastel de Frango", PASTEIS_FRANGO, 1100, 3, &["frango desfiado", "milho"]),
        pastel("frango-catupiry", "Frango c/ Catupiry", PASTEIS_FRANGO, 1400, 4, &["frango desfiado", "catupiry"]),
        pastel("quatro-queijos", "4 Queijos Especial", PASTEIS_ESPECIAIS, 1600, 5, &["mussarela", "provolone", "parmesao", "catupiry"]),
        pastel("pastel-bacalhau", "Pastel de Bacalhau", PASTEIS_ESPECIAIS, 2200, 6, &["bacalhau", "batata", "azeite"]),
        drink("caldo-cana", "Caldo de Cana 500ml", 800, 7, Some(OptionGroup {
            name: "Sabor".to_string(),
            required: false,
            choices: vec!["Puro".to_string(), "Limao".to_string(), "Abacaxi".to_string()],
        })),
        drink("coca-lata", "Coca-Cola Lata", 650, 8, None),
    ]
}

fn pastel(
    id: &str,
    name: &str,
    category: &str,
    cents: i64,
    sort_order: i32,
    ingredients: &[&str],
) -> Product {
    Product {
        id: id.to_string(),
        name: name.to_string(),
        description: String::new(),
        category: category.to_string(),
        price: Decimal::new(cents, 2),
        image: String::new(),
        is_active: true,
        ingredients: Some(ingredients.iter().map(|s| s.to_string()).collect()),
        option_groups: vec![],
        requires_preparation: true,
        sort_order,
    }
}

fn drink(
    id: &str,
    name: &str,
    cents: i64,
    sort_order: i32,
    options: Option<OptionGroup>,
) -> Product {
    Product {
        id: id.to_string(),
        name: name.to_string(),
        description: String::new(),
        category: BEBIDAS.to_string(),
        price: Decimal::new(cents, 2),
        image: String::new(),
        is_active: true,
        ingredients: None,
        option_groups: options.into_iter().collect(),
        requires_preparation: false,
        sort_order,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_menu_shape() {
        let products = products();
        assert_eq!(products.len(), 8);
        assert!(products.iter().filter(|p| p.category == BEBIDAS).all(|p| !p.requires_preparation));
        assert!(products.iter().filter(|p| p.category != BEBIDAS).all(|p| p.requires_preparation));

        let names: Vec<String> = categories().into_iter().map(|c| c.name).collect();
        for product in &products {
            assert!(names.contains(&product.category));
        }
    }
}
