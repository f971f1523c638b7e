//! Container location: find the exportable slides in a rendered document.

use crate::error::{ExportError, Result};
use scraper::{ElementRef, Html};

/// Collect every element whose class list contains `marker`, in document
/// (depth-first, pre-order) order.
///
/// Fails with `ContainerNotFound` when no element matches, and with
/// `ContainerEmpty` (1-based position) when a matched container has no child
/// elements.
pub fn locate<'a>(doc: &'a Html, marker: &str) -> Result<Vec<ElementRef<'a>>> {
    let containers: Vec<ElementRef<'a>> = doc
        .tree
        .root()
        .descendants()
        .filter_map(ElementRef::wrap)
        .filter(|el| el.value().classes().any(|class| class == marker))
        .collect();

    if containers.is_empty() {
        return Err(ExportError::ContainerNotFound {
            marker: marker.to_string(),
        });
    }

    for (i, container) in containers.iter().enumerate() {
        let has_child_element = container.children().any(|child| child.value().is_element());
        if !has_child_element {
            return Err(ExportError::ContainerEmpty { index: i + 1 });
        }
    }

    Ok(containers)
}
