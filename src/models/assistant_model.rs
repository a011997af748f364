/// Entries of the sidebar model picker. The choice is only displayed; the
/// backend serves a single model and the request carries no model field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AssistantModel {
    #[default]
    HukumV1,
    HukumV2,
}

impl AssistantModel {
    pub const ALL: [AssistantModel; 2] = [AssistantModel::HukumV1, AssistantModel::HukumV2];

    pub fn display_name(&self) -> &'static str {
        match self {
            AssistantModel::HukumV1 => "NLP Hukum v1",
            AssistantModel::HukumV2 => "NLP Hukum v2 (Coming Soon)",
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, AssistantModel::HukumV1)
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_v1_is_selectable() {
        assert_eq!(AssistantModel::default(), AssistantModel::HukumV1);
        assert!(AssistantModel::HukumV1.is_available());
        assert!(!AssistantModel::HukumV2.is_available());
        assert_eq!(AssistantModel::from_index(1), Some(AssistantModel::HukumV2));
        assert_eq!(AssistantModel::from_index(2), None);
    }
}
