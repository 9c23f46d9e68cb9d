/// Which feature, if any, is selected. Keyed by join key so that a selection
/// survives rebuilding the layer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SelectionState {
    #[default]
    NoSelection,
    Selected {
        join_key: String,
    },
}

impl SelectionState {
    pub fn join_key(&self) -> Option<&str> {
        match self {
            SelectionState::NoSelection => None,
            SelectionState::Selected { join_key } => Some(join_key),
        }
    }

    pub fn is_selected(&self, join_key: &str) -> bool {
        self.join_key() == Some(join_key)
    }
}
