//! Read-only view of the surface's selected entity for property widgets.

use crate::surface::SelectedEntity;
use kurbo::Rect;

/// Projection of the selected entity, rebuilt on every selection change.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionInfo {
    pub kind: String,
    pub id: Option<String>,
    /// On-surface bounds (scale applied).
    pub geometry: Rect,
    pub opacity: f64,
}

impl SelectionInfo {
    pub fn x(&self) -> f64 {
        self.geometry.x0
    }

    pub fn y(&self) -> f64 {
        self.geometry.y0
    }

    pub fn width(&self) -> f64 {
        self.geometry.width()
    }

    pub fn height(&self) -> f64 {
        self.geometry.height()
    }
}

/// Project the surface's selected entity, if any.
pub fn project(entity: Option<&SelectedEntity>) -> Option<SelectionInfo> {
    let entity = entity?;
    let width = entity.width * entity.scale_x;
    let height = entity.height * entity.scale_y;
    Some(SelectionInfo {
        kind: entity.kind.clone(),
        id: entity.id.clone(),
        geometry: Rect::new(entity.left, entity.top, entity.left + width, entity.top + height),
        opacity: entity.opacity.unwrap_or(1.0).clamp(0.0, 1.0),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity() -> SelectedEntity {
        SelectedEntity {
            kind: "rect".to_string(),
            id: Some("r1".to_string()),
            left: 100.0,
            top: 50.0,
            width: 150.0,
            height: 100.0,
            scale_x: 0.5,
            scale_y: 2.0,
            opacity: None,
        }
    }

    #[test]
    fn test_project_none() {
        assert!(project(None).is_none());
    }

    #[test]
    fn test_project_applies_scale() {
        let info = project(Some(&entity())).unwrap();
        assert_eq!(info.kind, "rect");
        assert_eq!(info.x(), 100.0);
        assert_eq!(info.y(), 50.0);
        assert_eq!(info.width(), 75.0);
        assert_eq!(info.height(), 200.0);
        assert_eq!(info.opacity, 1.0);
    }

    #[test]
    fn test_zero_opacity_is_kept() {
        let mut e = entity();
        e.opacity = Some(0.0);
        assert_eq!(project(Some(&e)).unwrap().opacity, 0.0);
    }
}
