//! Base catalog loading and validation of shop-added products.

use crate::money::Money;
use crate::types::{Category, Product, ProductId};
use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use thiserror::Error;

/// Catalog shipped with the binary
const BUNDLED_CATALOG: &str = include_str!("../data/pizzas.json");

/// Image used for products added without one
pub const DEFAULT_PRODUCT_IMAGE: &str =
    "https://images.unsplash.com/photo-1574071318508-1cdbab80d002?w=800&h=600&fit=crop";

/// Minimum length of a product name and of each ingredient, after trimming
pub const MIN_TEXT_LEN: usize = 2;

/// Errors that can occur while loading a catalog
#[derive(Error, Debug)]
pub enum CatalogError {
    /// The catalog file could not be read
    #[error("Failed to read catalog {path}: {source}")]
    Io {
        /// File that failed
        path: String,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// The catalog is not a JSON array of products
    #[error("Malformed catalog: {0}")]
    Parse(#[from] serde_json::Error),

    /// Two products share an id
    #[error("Duplicate product id '{0}'")]
    DuplicateId(ProductId),

    /// A product breaks a catalog invariant
    #[error("Invalid product '{id}': {reason}")]
    InvalidProduct {
        /// Offending product
        id: ProductId,
        /// What is wrong with it
        reason: &'static str,
    },
}

/// A validated list of products
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Catalog {
    products: Vec<Product>,
}

impl Catalog {
    /// The catalog bundled with the binary
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] if the bundled data is malformed.
    pub fn bundled() -> Result<Self, CatalogError> {
        Self::from_json(BUNDLED_CATALOG)
    }

    /// Parses and validates a JSON array of products
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Parse`] for malformed JSON and
    /// [`CatalogError::DuplicateId`] / [`CatalogError::InvalidProduct`] when
    /// a product breaks an invariant.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let products: Vec<Product> = serde_json::from_str(json)?;
        Self::from_products(products)
    }

    /// Reads a catalog file
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Io`] if the file cannot be read, otherwise as
    /// [`Catalog::from_json`].
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let json = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| CatalogError::Io {
                path: path.display().to_string(),
                source,
            })?;
        Self::from_json(&json)
    }

    /// Validates an in-memory list of products
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::DuplicateId`] or
    /// [`CatalogError::InvalidProduct`] for the first offending product.
    pub fn from_products(products: Vec<Product>) -> Result<Self, CatalogError> {
        let mut seen = HashSet::new();
        for product in &products {
            if !seen.insert(&product.id) {
                return Err(CatalogError::DuplicateId(product.id.clone()));
            }
            let reason = if product.id.as_str().is_empty() {
                Some("empty id")
            } else if product.name.trim().is_empty() {
                Some("empty name")
            } else if product.price.is_zero() {
                Some("price must be positive")
            } else if product.ingredients.is_empty() {
                Some("no ingredients")
            } else {
                None
            };
            if let Some(reason) = reason {
                return Err(CatalogError::InvalidProduct {
                    id: product.id.clone(),
                    reason,
                });
            }
        }
        Ok(Self { products })
    }

    /// Products in catalog order
    #[must_use]
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    /// Consumes the catalog, returning its products
    #[must_use]
    pub fn into_products(self) -> Vec<Product> {
        self.products
    }

    /// Number of products
    #[must_use]
    pub fn len(&self) -> usize {
        self.products.len()
    }

    /// Checks if the catalog is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}

/// Field of a [`ProductDraft`] that failed validation
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DraftField {
    /// Product name
    Name,
    /// Unit price
    Price,
    /// Ingredient list
    Ingredients,
}

/// A single validation failure
#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum DraftError {
    /// Name is blank
    #[error("Pizza name is required")]
    NameMissing,
    /// Name shorter than [`MIN_TEXT_LEN`]
    #[error("Pizza name must be at least 2 characters")]
    NameTooShort,
    /// Price missing, unparsable or not positive
    #[error("Price must be a positive number")]
    InvalidPrice,
    /// Every ingredient entry is blank
    #[error("At least one ingredient is required")]
    NoIngredients,
    /// Some ingredient shorter than [`MIN_TEXT_LEN`]
    #[error("Each ingredient must be at least 2 characters")]
    IngredientTooShort,
}

impl DraftError {
    /// Field the failure belongs to
    #[must_use]
    pub const fn field(&self) -> DraftField {
        match self {
            Self::NameMissing | Self::NameTooShort => DraftField::Name,
            Self::InvalidPrice => DraftField::Price,
            Self::NoIngredients | Self::IngredientTooShort => DraftField::Ingredients,
        }
    }
}

/// Every validation failure of a draft, at most one per field
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DraftErrors(Vec<DraftError>);

impl DraftErrors {
    /// Failures in field order
    #[must_use]
    pub fn errors(&self) -> &[DraftError] {
        &self.0
    }

    /// Failure for `field`, if any
    #[must_use]
    pub fn for_field(&self, field: DraftField) -> Option<&DraftError> {
        self.0.iter().find(|e| e.field() == field)
    }
}

impl fmt::Display for DraftErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("invalid product")?;
        for (i, error) in self.0.iter().enumerate() {
            let sep = if i == 0 { ": " } else { "; " };
            write!(f, "{sep}{error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for DraftErrors {}

/// Raw input for a product added by the shop
///
/// The price is kept as entered so validation can report it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProductDraft {
    /// Name as entered
    pub name: String,
    /// Price as entered, in currency units
    pub price: String,
    /// Ingredient entries; blank entries are dropped
    pub ingredients: Vec<String>,
    /// Dietary category
    pub category: Category,
    /// Optional description; blank means none
    pub description: String,
    /// Optional image; none means [`DEFAULT_PRODUCT_IMAGE`]
    pub image_url: Option<String>,
}

impl Default for ProductDraft {
    fn default() -> Self {
        Self {
            name: String::new(),
            price: String::new(),
            ingredients: vec![String::new()],
            category: Category::Vegetarian,
            description: String::new(),
            image_url: None,
        }
    }
}

impl ProductDraft {
    fn parsed_price(&self) -> Option<Money> {
        let value: f64 = self.price.trim().parse().ok()?;
        Money::from_decimal(value).ok().filter(|m| !m.is_zero())
    }

    fn filled_ingredients(&self) -> impl Iterator<Item = &str> {
        self.ingredients
            .iter()
            .map(|i| i.as_str().trim())
            .filter(|i| !i.is_empty())
    }

    /// Checks every field
    ///
    /// # Errors
    ///
    /// Returns [`DraftErrors`] listing each failing field.
    pub fn validate(&self) -> Result<(), DraftErrors> {
        let mut errors = Vec::new();

        let name = self.name.trim();
        if name.is_empty() {
            errors.push(DraftError::NameMissing);
        } else if name.chars().count() < MIN_TEXT_LEN {
            errors.push(DraftError::NameTooShort);
        }

        if self.parsed_price().is_none() {
            errors.push(DraftError::InvalidPrice);
        }

        let mut ingredients = self.filled_ingredients().peekable();
        if ingredients.peek().is_none() {
            errors.push(DraftError::NoIngredients);
        } else if ingredients.any(|i| i.chars().count() < MIN_TEXT_LEN) {
            errors.push(DraftError::IngredientTooShort);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(DraftErrors(errors))
        }
    }

    /// Builds the product with `id`
    ///
    /// # Errors
    ///
    /// Returns [`DraftErrors`] if the draft does not validate.
    pub fn into_product(self, id: ProductId) -> Result<Product, DraftErrors> {
        self.validate()?;
        let price = self
            .parsed_price()
            .ok_or_else(|| DraftErrors(vec![DraftError::InvalidPrice]))?;
        let ingredients = self.filled_ingredients().map(str::to_string).collect();

        let mut product = Product::new(id, self.name.trim(), price, ingredients)
            .with_category(self.category)
            .with_image_url(self.image_url.as_deref().unwrap_or(DEFAULT_PRODUCT_IMAGE));
        let description = self.description.trim();
        if !description.is_empty() {
            product = product.with_description(description);
        }
        Ok(product)
    }
}
