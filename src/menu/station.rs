/// An allow-listed station. Order in the allow-list is the order stations
/// are reported in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StationSpec {
    pub name: String,
    /// Soup and snack stations list per-dish calories but no header total.
    pub show_total: bool,
}

impl StationSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            show_total: true,
        }
    }

    #[must_use]
    pub fn without_total(mut self) -> Self {
        self.show_total = false;
        self
    }

    pub fn defaults() -> Vec<Self> {
        vec![
            Self::new("Home Zone 1"),
            Self::new("True Balance"),
            Self::new("Soup Station").without_total(),
        ]
    }
}
