/// Options for an update.
///
/// With `upsert` set, an update that matches nothing inserts a new document
/// built from the filter's equality conditions and the update.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateOptions {
    upsert: bool,
}

impl UpdateOptions {
    pub fn new(upsert: bool) -> Self {
        Self { upsert }
    }

    pub fn is_upsert(&self) -> bool {
        self.upsert
    }
}

pub fn upsert() -> UpdateOptions {
    UpdateOptions::new(true)
}
