//! Category lookups for article classification.

use std::collections::BTreeSet;

use crate::context::Context;
use crate::di::FromContext;
use crate::error::AppError;
use crate::models::{ArticleCategory, CategoryMap, EntityKind};
use crate::repositories::DocumentRepository;

/// Repository resolving legacy category numbers to category documents.
#[derive(FromContext, Clone)]
pub struct CategoryRepository {
    documents: DocumentRepository,
}

impl CategoryRepository {
    /// Find a category by its legacy number.
    pub async fn find_by_number(&self, number: i64) -> Result<Option<CategoryMap>, AppError> {
        let mut found = self
            .documents
            .find_by_field::<CategoryMap>("number", &number.to_string())
            .await?;
        Ok(if found.is_empty() {
            None
        } else {
            Some(found.swap_remove(0))
        })
    }

    /// Resolve every leaf number and its lineage into article categories.
    ///
    /// Each number appears once, in first-seen order. A leaf without a
    /// category document fails with `DependencyNotFound`; derived parent
    /// numbers that do not exist are skipped.
    pub async fn resolve(&self, leaves: &[i64]) -> Result<Vec<ArticleCategory>, AppError> {
        let mut seen = BTreeSet::new();
        let mut categories = Vec::new();

        for &leaf in leaves {
            for (depth, number) in category_lineage(leaf).into_iter().enumerate() {
                if !seen.insert(number) {
                    continue;
                }
                match self.find_by_number(number).await? {
                    Some(category) => categories.push(ArticleCategory {
                        subcategory: category.is_subcategory(),
                        number: category.number,
                        reference: category.id,
                    }),
                    None if depth == 0 => {
                        return Err(AppError::dependency(
                            EntityKind::Article,
                            format!("category {}", number),
                        ))
                    }
                    None => {}
                }
            }
        }

        Ok(categories)
    }
}

/// A leaf category number followed by its derived parent numbers.
pub fn category_lineage(number: i64) -> Vec<i64> {
    if number >= 1000 {
        vec![number, number / 100, number / 1000]
    } else if number >= 100 {
        vec![number, number / 10, number / 100]
    } else if number >= 10 {
        vec![number, number / 10]
    } else {
        vec![number]
    }
}
