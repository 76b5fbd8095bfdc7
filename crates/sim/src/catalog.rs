//! Seeded catalog
//!
//! The three demo products the journeys shop for. Sizes and colours mirror
//! the public demo storefront so scenario code reads the same against either
//! backend.

/// One purchasable product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    pub name: String,
    pub sizes: Vec<String>,
    pub colors: Vec<String>,
}

impl Product {
    pub fn new(name: &str, sizes: &[&str], colors: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            sizes: sizes.iter().map(|s| s.to_string()).collect(),
            colors: colors.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Whether adding to cart requires choosing size and colour first.
    pub fn has_options(&self) -> bool {
        !self.sizes.is_empty() || !self.colors.is_empty()
    }
}

/// The demo shop's catalog slice the journeys exercise.
pub fn demo_catalog() -> Vec<Product> {
    vec![
        Product::new(
            "Proteus Fitness Jackshirt",
            &["XS", "S", "M", "L", "XL"],
            &["Black", "Blue", "Orange"],
        ),
        // A simple product: no swatches at all.
        Product::new("Overnight Duffle", &[], &[]),
        Product::new(
            "Ina Compression Short",
            &["28", "29", "30", "31", "32"],
            &["Blue", "Orange", "Red"],
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duffle_has_no_options() {
        let catalog = demo_catalog();
        let duffle = catalog.iter().find(|p| p.name == "Overnight Duffle").unwrap();
        assert!(!duffle.has_options());
    }

    #[test]
    fn jackshirt_offers_xl_in_orange() {
        let catalog = demo_catalog();
        let shirt = catalog
            .iter()
            .find(|p| p.name == "Proteus Fitness Jackshirt")
            .unwrap();
        assert!(shirt.sizes.iter().any(|s| s == "XL"));
        assert!(shirt.colors.iter().any(|c| c == "Orange"));
    }
}
