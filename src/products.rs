//! The storefront's catalogue.

use crate::{id::ProductId, utils};
use serde_derive::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::{self, Display, Formatter};

/// Which animal a product is for.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Category {
    Cat,
    Dog,
    /// A category this client doesn't know about yet.
    Other(String),
}

impl Category {
    pub fn as_str(&self) -> &str {
        match self {
            Category::Cat => "Cat",
            Category::Dog => "Dog",
            Category::Other(other) => other,
        }
    }
}

impl From<String> for Category {
    fn from(s: String) -> Category {
        match s.as_str() {
            "Cat" | "cat" => Category::Cat,
            "Dog" | "dog" => Category::Dog,
            _ => Category::Other(s),
        }
    }
}

impl From<Category> for String {
    fn from(category: Category) -> String { category.as_str().to_string() }
}

impl std::str::FromStr for Category {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Category, Self::Err> {
        Ok(Category::from(s.to_string()))
    }
}

impl Display for Category {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single item in the catalogue.
///
/// Everything except the identifier and price is optional on the wire, so
/// missing or malformed descriptive fields deserialize to empty values
/// instead of failing the whole payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct Product {
    #[serde(rename = "_id")]
    pub id: ProductId,
    #[serde(default, deserialize_with = "utils::lenient_string")]
    pub title: String,
    #[serde(default, deserialize_with = "utils::lenient_string")]
    pub description: String,
    /// The unit price, in rupees.
    pub price: f64,
    #[serde(default, deserialize_with = "lenient_category")]
    pub category: Option<Category>,
    #[serde(default = "default_weight", deserialize_with = "lenient_weight")]
    pub weight: String,
    #[serde(default, deserialize_with = "utils::lenient_string")]
    pub image: String,
}

impl Product {
    pub fn new(id: impl Into<ProductId>, title: &str, price: f64) -> Self {
        Product {
            id: id.into(),
            title: title.to_string(),
            description: String::new(),
            price,
            category: None,
            weight: default_weight(),
            image: String::new(),
        }
    }
}

pub(crate) const DEFAULT_WEIGHT: &str = "1kg";

fn default_weight() -> String { DEFAULT_WEIGHT.to_string() }

fn lenient_weight<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(utils::lenient_optional_string(deserializer)?
        .unwrap_or_else(default_weight))
}

fn lenient_category<'de, D>(
    deserializer: D,
) -> Result<Option<Category>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(utils::lenient_optional_string(deserializer)?.map(Category::from))
}

/// Read a list of products, skipping anything which isn't a usable product
/// (e.g. a `null` left behind by a deleted product).
///
/// Anything other than an array is treated as an empty list.
pub(crate) fn products_from_entries(entries: &Value) -> Vec<Product> {
    let raw = match entries.as_array() {
        Some(raw) => raw,
        None => return Vec::new(),
    };

    let products: Vec<Product> = raw
        .iter()
        .filter_map(|entry| match serde_json::from_value::<Product>(entry.clone()) {
            Ok(product) => Some(product),
            Err(e) => {
                log::trace!("Skipping product {}: {}", entry, e);
                None
            },
        })
        .collect();

    let dropped = raw.len() - products.len();
    if dropped > 0 {
        log::debug!("Filtered out {} invalid products", dropped);
    }

    products
}

/// The image attached to a product upload.
#[derive(Debug, Clone, PartialEq)]
pub enum ProductImage {
    /// Point at an image that is already hosted somewhere.
    Url(String),
    /// Upload the file's contents alongside the product.
    File {
        filename: String,
        mime_type: String,
        contents: Vec<u8>,
    },
}

/// The fields an admin fills in when creating or editing a product.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductForm {
    /// Only set when editing an existing product.
    pub id: Option<ProductId>,
    pub title: String,
    pub description: String,
    pub price: f64,
    pub category: Category,
    pub weight: Option<String>,
    pub image: ProductImage,
}

impl ProductForm {
    /// Check the form is complete before sending it off.
    pub fn validate(&self) -> Result<(), ProductFormError> {
        if self.title.trim().is_empty()
            || self.description.trim().is_empty()
            || self.category.as_str().is_empty()
        {
            return Err(ProductFormError::MissingFields);
        }

        if !(self.price > 0.0) {
            return Err(ProductFormError::BadPrice(self.price));
        }

        match &self.image {
            ProductImage::Url(url) if url.trim().is_empty() => {
                Err(ProductFormError::MissingImage)
            },
            ProductImage::File { contents, .. } if contents.is_empty() => {
                Err(ProductFormError::MissingImage)
            },
            _ => Ok(()),
        }
    }

    pub fn weight(&self) -> &str {
        match self.weight.as_deref() {
            Some(w) if !w.trim().is_empty() => w,
            _ => DEFAULT_WEIGHT,
        }
    }

    /// The text fields, in the order the backend's upload handler expects.
    pub(crate) fn text_fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = Vec::new();

        if let Some(id) = &self.id {
            fields.push(("id", id.to_string()));
        }
        fields.push(("title", self.title.clone()));
        fields.push(("description", self.description.clone()));
        fields.push(("price", self.price.to_string()));
        fields.push(("category", self.category.to_string()));
        fields.push(("weight", self.weight().to_string()));

        fields
    }
}

/// Reasons a [`ProductForm`] can't be submitted.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProductFormError {
    #[error("Please fill in all required fields")]
    MissingFields,
    #[error("The price must be a positive amount, not {0}")]
    BadPrice(f64),
    #[error("Please select an image or provide an image URL")]
    MissingImage,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deserialize_a_full_product() {
        let src = json!({
            "_id": "64f1",
            "title": "Salmon Kibble",
            "description": "Crunchy",
            "price": 1299,
            "category": "Cat",
            "weight": "3kg",
            "image": "https://img.example/salmon.png",
        });

        let got: Product = serde_json::from_value(src).unwrap();

        assert_eq!(got.id, ProductId::from("64f1"));
        assert_eq!(got.price, 1299.0);
        assert_eq!(got.category, Some(Category::Cat));
        assert_eq!(got.weight, "3kg");
    }

    #[test]
    fn descriptive_fields_are_optional() {
        let src = json!({ "_id": "p", "price": 10.5, "title": null, "category": 7 });

        let got: Product = serde_json::from_value(src).unwrap();

        assert_eq!(got.title, "");
        assert_eq!(got.category, None);
        assert_eq!(got.weight, DEFAULT_WEIGHT);
    }

    #[test]
    fn unusable_products_are_skipped() {
        let src = json!([
            null,
            { "_id": "p1", "title": "Catnip", "price": 99 },
            { "_id": "p2", "title": "No price" },
            "p3",
        ]);

        let got = products_from_entries(&src);

        assert_eq!(got, vec![Product::new("p1", "Catnip", 99.0)]);
        assert!(products_from_entries(&Value::Null).is_empty());
    }

    #[test]
    fn unknown_categories_survive_a_round_trip() {
        let category = Category::from(String::from("Bird"));

        assert_eq!(category, Category::Other(String::from("Bird")));
        assert_eq!(String::from(category), "Bird");
    }

    #[test]
    fn incomplete_forms_are_rejected() {
        let mut form = ProductForm {
            id: None,
            title: String::from("Chew Toy"),
            description: String::new(),
            price: 250.0,
            category: Category::Dog,
            weight: None,
            image: ProductImage::Url(String::from("https://img.example/toy.png")),
        };
        assert_eq!(form.validate(), Err(ProductFormError::MissingFields));

        form.description = String::from("Squeaky");
        assert_eq!(form.validate(), Ok(()));
        assert_eq!(form.weight(), "1kg");

        form.image = ProductImage::Url(String::new());
        assert_eq!(form.validate(), Err(ProductFormError::MissingImage));
    }

    #[test]
    fn edit_forms_send_their_id_first() {
        let form = ProductForm {
            id: Some(ProductId::from("p-9")),
            title: String::from("Catnip"),
            description: String::from("Fresh"),
            price: 99.0,
            category: Category::Cat,
            weight: Some(String::from("100g")),
            image: ProductImage::Url(String::from("https://img.example/c.png")),
        };

        let fields = form.text_fields();

        assert_eq!(fields[0], ("id", String::from("p-9")));
        assert_eq!(fields.last().unwrap(), &("weight", String::from("100g")));
    }
}
