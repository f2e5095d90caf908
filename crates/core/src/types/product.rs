//! Product catalog types.
//!
//! Stored product records historically carried either a single `imageUrl`
//! or an ordered `imageUrls` list. [`ProductImages`] folds both shapes into
//! one ordered list when a record is read, so nothing downstream branches on
//! which field was present.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::ProductId;
use super::price::Price;

/// Shown wherever a product has no image at all.
pub const PLACEHOLDER_IMAGE_URL: &str = "https://via.placeholder.com/400?text=No+Image";

/// Public URL of a hosted product image.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageRef(String);

impl ImageRef {
    /// Wrap a public image URL.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    /// The URL as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for ImageRef {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Ordered image references for a product. May be empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductImages(Vec<ImageRef>);

impl ProductImages {
    /// Build from an ordered list, dropping blank entries.
    #[must_use]
    pub fn new(urls: impl IntoIterator<Item = String>) -> Self {
        Self(
            urls.into_iter()
                .map(|u| u.trim().to_owned())
                .filter(|u| !u.is_empty())
                .map(ImageRef)
                .collect(),
        )
    }

    /// Normalize the legacy single/multi image fields.
    ///
    /// A non-empty `image_urls` list wins. Otherwise a non-blank `image_url`
    /// becomes a one-element list. Otherwise the result is empty.
    ///
    /// ```
    /// use sparktizen_core::ProductImages;
    ///
    /// let images = ProductImages::from_legacy(Some("a.png".into()), None);
    /// assert_eq!(images.primary().map(|i| i.as_str()), Some("a.png"));
    ///
    /// let images = ProductImages::from_legacy(
    ///     Some("old.png".into()),
    ///     Some(vec!["b.png".into(), "c.png".into()]),
    /// );
    /// assert_eq!(images.len(), 2);
    /// ```
    #[must_use]
    pub fn from_legacy(image_url: Option<String>, image_urls: Option<Vec<String>>) -> Self {
        let list = Self::new(image_urls.unwrap_or_default());
        if !list.is_empty() {
            return list;
        }
        Self::new(image_url)
    }

    /// First image, if any.
    #[must_use]
    pub fn primary(&self) -> Option<&ImageRef> {
        self.0.first()
    }

    /// First image URL, or the placeholder when the product has none.
    #[must_use]
    pub fn primary_or_placeholder(&self) -> &str {
        self.primary().map_or(PLACEHOLDER_IMAGE_URL, ImageRef::as_str)
    }

    /// Iterate over the images in display order.
    pub fn iter(&self) -> impl Iterator<Item = &ImageRef> {
        self.0.iter()
    }

    /// Image URLs as owned strings (storage form).
    #[must_use]
    pub fn to_urls(&self) -> Vec<String> {
        self.0.iter().map(|i| i.0.clone()).collect()
    }

    /// Number of images.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no images.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<ImageRef> for ProductImages {
    fn from_iter<T: IntoIterator<Item = ImageRef>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: Price,
    pub images: ProductImages,
    pub in_stock: bool,
    pub created_at: DateTime<Utc>,
}

/// Editable product fields (admin update form).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductFields {
    pub name: String,
    pub description: String,
    pub price: Price,
    pub in_stock: bool,
}

impl ProductFields {
    /// Names of required text fields that are blank.
    #[must_use]
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.name.trim().is_empty() {
            missing.push("name");
        }
        if self.description.trim().is_empty() {
            missing.push("description");
        }
        missing
    }
}

/// A product about to be created. The catalog assigns the id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProduct {
    pub fields: ProductFields,
    pub images: ProductImages,
}

impl NewProduct {
    /// Materialize into a stored product with the given id and timestamp.
    #[must_use]
    pub fn into_product(self, id: ProductId, created_at: DateTime<Utc>) -> Product {
        Product {
            id,
            name: self.fields.name,
            description: self.fields.description,
            price: self.fields.price,
            images: self.images,
            in_stock: self.fields.in_stock,
            created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_legacy_prefers_list() {
        let images = ProductImages::from_legacy(
            Some("single.png".to_owned()),
            Some(vec!["one.png".to_owned(), "two.png".to_owned()]),
        );
        assert_eq!(images.to_urls(), vec!["one.png", "two.png"]);
    }

    #[test]
    fn test_from_legacy_empty_list_falls_back_to_single() {
        let images = ProductImages::from_legacy(Some("single.png".to_owned()), Some(Vec::new()));
        assert_eq!(images.to_urls(), vec!["single.png"]);
    }

    #[test]
    fn test_from_legacy_nothing() {
        let images = ProductImages::from_legacy(Some("   ".to_owned()), None);
        assert!(images.is_empty());
        assert_eq!(images.primary_or_placeholder(), PLACEHOLDER_IMAGE_URL);
    }

    #[test]
    fn test_blank_entries_dropped() {
        let images = ProductImages::new(vec![String::new(), "a.png".to_owned()]);
        assert_eq!(images.len(), 1);
        assert_eq!(images.primary_or_placeholder(), "a.png");
    }

    #[test]
    fn test_missing_fields() {
        let fields = ProductFields {
            name: " ".to_owned(),
            description: "Soft cotton".to_owned(),
            price: Price::ZERO,
            in_stock: true,
        };
        assert_eq!(fields.missing_fields(), vec!["name"]);
    }
}
