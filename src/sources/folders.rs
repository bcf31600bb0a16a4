use crate::sources::Source;

/// Bookmarked folders, listed exactly as configured (`~` included).
#[derive(Debug, Clone, Default)]
pub struct Folders(Vec<String>);

impl Folders {
    pub fn new(folders: Vec<String>) -> Self {
        Self(folders)
    }
}

impl Source for Folders {
    fn items(&self) -> Vec<String> {
        self.0.clone()
    }
}
