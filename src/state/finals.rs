/// The finals collection: images the user picked for export
use super::data::GeneratedImage;

/// Ordered, user-curated list of posters, unique by id
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Finals {
    posters: Vec<GeneratedImage>,
}

impl Finals {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an image unless one with the same id is already saved
    ///
    /// Returns true if the collection changed.
    pub fn promote(&mut self, image: GeneratedImage) -> bool {
        if self.contains(&image.id) {
            return false;
        }
        self.posters.push(image);
        true
    }

    /// Drop the entry with this id, if any
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.posters.len();
        self.posters.retain(|p| p.id != id);
        self.posters.len() != before
    }

    /// Move one poster, drag-and-drop style
    ///
    /// The poster is taken out at `from` and inserted at `to` in the shortened
    /// list. A missing or out-of-range target leaves the order untouched.
    pub fn reorder(&mut self, from: usize, to: Option<usize>) -> bool {
        let Some(to) = to else {
            return false;
        };
        if from >= self.posters.len() || to >= self.posters.len() {
            return false;
        }
        if from == to {
            return true;
        }
        let poster = self.posters.remove(from);
        self.posters.insert(to, poster);
        true
    }

    pub fn contains(&self, id: &str) -> bool {
        self.posters.iter().any(|p| p.id == id)
    }

    pub fn get(&self, id: &str) -> Option<&GeneratedImage> {
        self.posters.iter().find(|p| p.id == id)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, GeneratedImage> {
        self.posters.iter()
    }

    pub fn len(&self) -> usize {
        self.posters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posters.is_empty()
    }

    pub fn ids(&self) -> Vec<&str> {
        self.posters.iter().map(|p| p.id.as_str()).collect()
    }
}

impl<'a> IntoIterator for &'a Finals {
    type Item = &'a GeneratedImage;
    type IntoIter = std::slice::Iter<'a, GeneratedImage>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(id: &str) -> GeneratedImage {
        GeneratedImage {
            id: id.to_string(),
            src: "data:image/png;base64,AAAA".to_string(),
            prompt: format!("prompt for {id}"),
        }
    }

    fn finals_of(ids: &[&str]) -> Finals {
        let mut finals = Finals::new();
        for id in ids {
            finals.promote(image(id));
        }
        finals
    }

    #[test]
    fn test_promote_is_idempotent() {
        let mut finals = Finals::new();
        assert!(finals.promote(image("a")));
        assert!(!finals.promote(image("a")));
        assert_eq!(finals.len(), 1);

        assert!(finals.promote(image("b")));
        assert_eq!(finals.ids(), ["a", "b"]);
    }

    #[test]
    fn test_remove() {
        let mut finals = finals_of(&["a", "b", "c"]);
        assert!(finals.remove("b"));
        assert_eq!(finals.ids(), ["a", "c"]);

        assert!(!finals.remove("missing"));
        assert_eq!(finals.len(), 2);
    }

    #[test]
    fn test_reorder_moves_one_element() {
        let mut finals = finals_of(&["a", "b", "c", "d"]);
        assert!(finals.reorder(0, Some(2)));
        assert_eq!(finals.ids(), ["b", "c", "a", "d"]);

        assert!(finals.reorder(3, Some(0)));
        assert_eq!(finals.ids(), ["d", "b", "c", "a"]);
    }

    #[test]
    fn test_reorder_without_target_is_noop() {
        let mut finals = finals_of(&["a", "b", "c"]);
        assert!(!finals.reorder(0, None));
        assert!(!finals.reorder(0, Some(3)));
        assert!(!finals.reorder(5, Some(0)));
        assert_eq!(finals.ids(), ["a", "b", "c"]);
    }

    #[test]
    fn test_lookup() {
        let finals = finals_of(&["a", "b"]);
        assert!(finals.contains("b"));
        assert_eq!(finals.get("a").map(|p| p.prompt.as_str()), Some("prompt for a"));
        assert!(finals.get("z").is_none());
        assert_eq!((&finals).into_iter().count(), 2);
    }
}
