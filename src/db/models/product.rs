//! Product Model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

use super::serde_helpers;

pub const PRODUCT_TABLE: &str = "product";

/// Catalog lifecycle state. Only `Active` products are sellable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductStatus {
    Draft,
    Active,
    Archived,
}

impl Default for ProductStatus {
    fn default() -> Self {
        Self::Draft
    }
}

/// One catalog image. `public_id` is the stored filename stem used to
/// address the file for deletion.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductImage {
    pub url: String,
    #[serde(default)]
    pub public_id: Option<String>,
    #[serde(default)]
    pub is_primary: bool,
}

/// Aggregate review score
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Rating {
    #[serde(default)]
    pub rate: f64,
    #[serde(default)]
    pub count: i64,
}

/// Product model. All prices are integer fils.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(
        default,
        with = "serde_helpers::option_record_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<RecordId>,
    pub title: String,
    pub slug: String,
    #[serde(default)]
    pub description: String,
    pub price_in_fils: i64,
    /// Pre-discount price; when set and higher than the price, the
    /// storefront shows a discount badge.
    #[serde(default)]
    pub compare_at_price_in_fils: Option<i64>,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub stock: i64,
    #[serde(default)]
    pub status: ProductStatus,
    #[serde(default)]
    pub images: Vec<ProductImage>,
    /// Record link to category
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub category: Option<RecordId>,
    #[serde(default)]
    pub rating: Rating,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_currency() -> String {
    "KWD".to_string()
}

impl Product {
    /// Image shown on cards and invoices: the one flagged primary,
    /// else the first, else none.
    pub fn primary_image(&self) -> Option<&ProductImage> {
        self.images
            .iter()
            .find(|img| img.is_primary)
            .or_else(|| self.images.first())
    }

    /// Rounded-down discount percentage, only when the compare-at price
    /// actually exceeds the selling price.
    pub fn discount_percent(&self) -> Option<i64> {
        match self.compare_at_price_in_fils {
            Some(compare) if compare > self.price_in_fils && compare > 0 => {
                Some((compare - self.price_in_fils) * 100 / compare)
            }
            _ => None,
        }
    }

    pub fn is_sellable(&self) -> bool {
        self.status == ProductStatus::Active
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductCreate {
    pub title: String,
    pub slug: String,
    pub description: Option<String>,
    pub price_in_fils: i64,
    pub compare_at_price_in_fils: Option<i64>,
    pub currency: Option<String>,
    pub stock: Option<i64>,
    pub status: Option<ProductStatus>,
    pub images: Option<Vec<ProductImage>>,
    pub category: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_in_fils: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compare_at_price_in_fils: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stock: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ProductStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<ProductImage>>,
    /// Outer Option: absent vs present; inner: explicit null detaches
    /// the category
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "serde_helpers::double_option_record_id"
    )]
    pub category: Option<Option<RecordId>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product_with_images(images: Vec<ProductImage>) -> Product {
        Product {
            id: None,
            title: "Whey 2kg".into(),
            slug: "whey-2kg".into(),
            description: String::new(),
            price_in_fils: 12500,
            compare_at_price_in_fils: None,
            currency: "KWD".into(),
            stock: 10,
            status: ProductStatus::Active,
            images,
            category: None,
            rating: Rating::default(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn img(url: &str, primary: bool) -> ProductImage {
        ProductImage {
            url: url.into(),
            public_id: None,
            is_primary: primary,
        }
    }

    #[test]
    fn primary_image_prefers_flag_then_first() {
        let p = product_with_images(vec![img("a", false), img("b", true)]);
        assert_eq!(p.primary_image().unwrap().url, "b");

        let p = product_with_images(vec![img("a", false), img("b", false)]);
        assert_eq!(p.primary_image().unwrap().url, "a");

        let p = product_with_images(vec![]);
        assert!(p.primary_image().is_none());
    }

    #[test]
    fn update_patch_distinguishes_null_from_absent_category() {
        // Explicit null must survive into the merge payload so the
        // category can be detached
        let patch: ProductUpdate = serde_json::from_str(r#"{"category": null}"#).unwrap();
        assert_eq!(patch.category, Some(None));
        let body = serde_json::to_value(&patch).unwrap();
        assert!(body.get("category").is_some_and(|v| v.is_null()));

        // Absent field stays out of the merge payload entirely
        let patch: ProductUpdate = serde_json::from_str("{}").unwrap();
        assert!(patch.category.is_none());
        let body = serde_json::to_value(&patch).unwrap();
        assert!(body.get("category").is_none());

        let patch: ProductUpdate =
            serde_json::from_str(r#"{"category": "category:protein"}"#).unwrap();
        assert_eq!(
            patch.category,
            Some(Some(RecordId::from_table_key("category", "protein")))
        );
    }

    #[test]
    fn discount_requires_higher_compare_price() {
        let mut p = product_with_images(vec![]);
        assert_eq!(p.discount_percent(), None);

        p.compare_at_price_in_fils = Some(25000);
        assert_eq!(p.discount_percent(), Some(50));

        p.compare_at_price_in_fils = Some(12500);
        assert_eq!(p.discount_percent(), None);

        p.compare_at_price_in_fils = Some(10000);
        assert_eq!(p.discount_percent(), None);
    }
}
