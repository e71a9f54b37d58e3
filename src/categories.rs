use crate::models::{CategoryDefinition, MaintenanceTask};

/// The set of categories tasks may refer to by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryRegistry {
    categories: Vec<CategoryDefinition>,
}

fn normalize(name: &str) -> String {
    name.trim().to_lowercase()
}

impl Default for CategoryRegistry {
    /// The categories a fresh installation starts with.
    fn default() -> Self {
        let defaults = [
            ("1", "Vehicle", "car", "blue"),
            ("2", "Generator", "zap", "amber"),
            ("3", "House", "home", "emerald"),
            ("4", "Electrical Panel", "layout", "purple"),
            ("5", "Other", "settings", "slate"),
        ];
        let categories = defaults
            .iter()
            .map(|(id, name, icon, color)| CategoryDefinition {
                id: id.to_string(),
                name: name.to_string(),
                icon: icon.to_string(),
                color: color.to_string(),
            })
            .collect();
        CategoryRegistry { categories }
    }
}

impl CategoryRegistry {
    pub fn new(categories: Vec<CategoryDefinition>) -> Self {
        CategoryRegistry { categories }
    }

    pub fn all(&self) -> &[CategoryDefinition] {
        &self.categories
    }

    pub fn into_vec(self) -> Vec<CategoryDefinition> {
        self.categories
    }

    /// Looks a category up ignoring case and surrounding whitespace.
    pub fn find_by_name(&self, name: &str) -> Option<&CategoryDefinition> {
        let wanted = normalize(name);
        self.categories.iter().find(|c| normalize(&c.name) == wanted)
    }

    /// Inserts `category`, replacing any existing entry with the same id.
    pub fn upsert(&mut self, category: CategoryDefinition) {
        match self.categories.iter_mut().find(|c| c.id == category.id) {
            Some(existing) => *existing = category,
            None => self.categories.push(category),
        }
    }

    /// Removes the category with `id`, returning it if present.
    pub fn remove(&mut self, id: &str) -> Option<CategoryDefinition> {
        let idx = self.categories.iter().position(|c| c.id == id)?;
        Some(self.categories.remove(idx))
    }
}

/// Number of tasks, completed ones included, that reference `name`.
pub fn usage_count(name: &str, tasks: &[MaintenanceTask]) -> usize {
    let wanted = normalize(name);
    tasks.iter().filter(|t| normalize(&t.category) == wanted).count()
}

pub fn in_use(name: &str, tasks: &[MaintenanceTask]) -> bool {
    usage_count(name, tasks) > 0
}
