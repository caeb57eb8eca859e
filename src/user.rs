use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};

use tracing::debug;

/// The desktop and laptop computers a single user runs the target application on.
///
/// Ids are kept as raw bytes, the inventory does not guarantee any encoding.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct User {
    desktops: HashSet<Vec<u8>>,
    laptops: HashSet<Vec<u8>>,
}

impl User {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_if_unique_desktop(&mut self, id: &[u8]) {
        self.desktops.insert(id.to_vec());
    }

    pub fn add_if_unique_laptop(&mut self, id: &[u8]) {
        self.laptops.insert(id.to_vec());
    }

    pub fn desktops(&self) -> usize {
        self.desktops.len()
    }

    pub fn laptops(&self) -> usize {
        self.laptops.len()
    }

    /// Number of licenses the user needs.
    ///
    /// A license can be moved between a user's desktop and laptop, so the
    /// larger of the two device counts covers both.
    pub fn applications(&self) -> usize {
        self.desktops.len().max(self.laptops.len())
    }
}

/// All users seen so far, keyed by user id
#[derive(Debug, Default)]
pub struct Users {
    users: HashMap<Vec<u8>, User>,
}

impl Users {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the user for `user_id`, inserting an empty one on first sighting
    pub fn get_or_create(&mut self, user_id: &[u8]) -> &mut User {
        match self.users.entry(user_id.to_vec()) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                debug!(user_id = %String::from_utf8_lossy(user_id), "new user");
                entry.insert(User::new())
            }
        }
    }

    pub fn get(&self, user_id: &[u8]) -> Option<&User> {
        self.users.get(user_id)
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    /// Sum of the licenses needed by every user
    pub fn total_applications(&self) -> usize {
        self.users.values().map(User::applications).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(desktops: &[&str], laptops: &[&str]) -> User {
        let mut user = User::new();
        for id in desktops {
            user.add_if_unique_desktop(id.as_bytes());
        }
        for id in laptops {
            user.add_if_unique_laptop(id.as_bytes());
        }
        user
    }

    #[test]
    fn test_new_user_is_empty() {
        let user = User::new();
        assert_eq!(user.desktops(), 0);
        assert_eq!(user.laptops(), 0);
        assert_eq!(user.applications(), 0);
    }

    #[test]
    fn test_add_desktop() {
        let mut user = User::new();
        user.add_if_unique_desktop(b"123");
        user.add_if_unique_desktop(b"456");
        assert_eq!(user.desktops(), 2);
        assert_eq!(user.laptops(), 0);

        // Duplicates are ignored
        user.add_if_unique_desktop(b"123");
        assert_eq!(user.desktops(), 2);
    }

    #[test]
    fn test_add_laptop() {
        let mut user = User::new();
        user.add_if_unique_laptop(b"123");
        user.add_if_unique_laptop(b"456");
        user.add_if_unique_laptop(b"456");
        assert_eq!(user.desktops(), 0);
        assert_eq!(user.laptops(), 2);
    }

    #[test]
    fn test_non_utf8_ids_stay_distinct() {
        let mut user = User::new();
        user.add_if_unique_desktop(b"caf\xe9");
        user.add_if_unique_desktop(b"caf\xe8");
        user.add_if_unique_desktop(b"caf\xe9");
        assert_eq!(user.desktops(), 2);
    }

    #[test]
    fn test_insert_order_does_not_matter() {
        assert_eq!(
            user(&["a", "b", "c"], &["x"]),
            user(&["c", "a", "b", "a"], &["x", "x"])
        );
    }

    #[test]
    fn test_same_id_in_both_sets() {
        let user = user(&["123"], &["123"]);
        assert_eq!(user.desktops(), 1);
        assert_eq!(user.laptops(), 1);
        assert_eq!(user.applications(), 1);
    }

    #[test]
    fn test_applications() {
        assert_eq!(user(&["123", "456"], &["789"]).applications(), 2);
        assert_eq!(user(&["210"], &["123", "456", "789"]).applications(), 3);
        assert_eq!(user(&["1", "2"], &["3", "4"]).applications(), 2);
        assert_eq!(user(&[], &["193"]).applications(), 1);
    }

    #[test]
    fn test_get_or_create_returns_same_user() {
        let mut users = Users::new();
        users.get_or_create(b"u1").add_if_unique_desktop(b"c1");
        users.get_or_create(b"u1").add_if_unique_laptop(b"c2");
        assert_eq!(users.len(), 1);

        let u1 = users.get(b"u1").expect("User exists");
        assert_eq!(u1.desktops(), 1);
        assert_eq!(u1.laptops(), 1);
    }

    #[test]
    fn test_total_applications_empty() {
        let users = Users::new();
        assert!(users.is_empty());
        assert_eq!(users.total_applications(), 0);
    }

    #[test]
    fn test_total_applications() {
        let mut users = Users::new();
        *users.get_or_create(b"474") = user(&["123", "456"], &["789"]);
        *users.get_or_create(b"189") = user(&["449", "198", "821", "330"], &["134"]);
        *users.get_or_create(b"551") = user(&[], &["193"]);
        *users.get_or_create(b"729") = user(&["874", "662"], &["272", "396", "854", "113"]);
        assert_eq!(users.len(), 4);
        assert_eq!(users.total_applications(), 11);
    }
}
