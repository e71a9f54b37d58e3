use chrono::{Local, NaiveDate};
use ratatui::widgets::TableState;

use crate::categories::usage_count;
use crate::commands::{
    cmd_add, cmd_category_add, cmd_category_remove, cmd_complete, cmd_edit, cmd_remove, list_tasks, ListOptions,
    TaskEdit, TaskInput,
};
use crate::error::Result;
use crate::models::{CategoryDefinition, MaintenanceTask, TaskId};
use crate::storage::Repository;

#[derive(PartialEq)]
pub enum InputMode {
    Normal,
    Editing,
    Adding,
}

#[derive(PartialEq)]
pub enum ViewMode {
    Tasks,
    Categories,
}

pub enum InputField {
    None,
    Name,
    NextDate,
    Every,
    Cost,
}

pub struct App<'a> {
    pub repo: &'a dyn Repository,
    /// Every stored task, the classifier's input.
    pub all_tasks: Vec<MaintenanceTask>,
    /// Rows of the task table.
    pub tasks: Vec<MaintenanceTask>,
    pub categories: Vec<CategoryDefinition>,
    pub state: TableState,
    pub category_state: TableState,
    pub view_mode: ViewMode,
    pub input_mode: InputMode,
    pub input_field: InputField,
    pub input_buffer: String,
    pub target_id: Option<TaskId>,
    pub add_state: AddState,
    pub show_completed: bool,
    /// Last error or confirmation, shown in the help bar.
    pub status: Option<String>,
}

/// State for the multi-step "Add Task" wizard.
#[derive(Default)]
pub struct AddState {
    pub name: String,
    pub category: String,
    pub last_date: String,
    pub every: Option<String>,
    pub step: usize, // 0: Name, 1: Category, 2: Last date, 3: Every, 4: Cost
}

impl<'a> App<'a> {
    /// Creates a new App instance and loads initial data.
    pub fn new(repo: &'a dyn Repository) -> App<'a> {
        let mut app = App {
            repo,
            all_tasks: Vec::new(),
            tasks: Vec::new(),
            categories: Vec::new(),
            state: TableState::default(),
            category_state: TableState::default(),
            view_mode: ViewMode::Tasks,
            input_mode: InputMode::Normal,
            input_field: InputField::None,
            input_buffer: String::new(),
            target_id: None,
            add_state: AddState::default(),
            show_completed: false,
            status: None,
        };
        app.reload();
        app
    }

    pub fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }

    fn report(&mut self, result: Result<()>) {
        if let Err(e) = result {
            self.status = Some(e.to_string());
        }
    }

    fn list_len(&self) -> usize {
        match self.view_mode {
            ViewMode::Tasks => self.tasks.len(),
            ViewMode::Categories => self.categories.len(),
        }
    }

    fn current_state(&mut self) -> &mut TableState {
        match self.view_mode {
            ViewMode::Tasks => &mut self.state,
            ViewMode::Categories => &mut self.category_state,
        }
    }

    /// Selects the next item in the current list.
    pub fn next(&mut self) {
        let len = self.list_len();
        if len == 0 { return; }
        let state = self.current_state();
        let i = match state.selected() {
            Some(i) if i + 1 < len => i + 1,
            _ => 0,
        };
        state.select(Some(i));
    }

    /// Selects the previous item in the current list.
    pub fn previous(&mut self) {
        let len = self.list_len();
        if len == 0 { return; }
        let state = self.current_state();
        let i = match state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        state.select(Some(i));
    }

    fn selected_task(&self) -> Option<&MaintenanceTask> {
        if self.view_mode != ViewMode::Tasks { return None; }
        self.state.selected().and_then(|i| self.tasks.get(i))
    }

    /// Marks the currently selected task as complete.
    pub fn complete_selected(&mut self) {
        let Some(task) = self.selected_task() else { return };
        if task.is_completed() {
            self.status = Some("Task is already completed.".into());
            return;
        }
        let id = task.id.clone();
        let result = cmd_complete(self.repo, &id, true);
        match result {
            Ok(Some(next)) => {
                self.status = next.next_date.map(|d| format!("Completed. Next occurrence due on {}", d));
            }
            Ok(None) => self.status = Some("Completed.".into()),
            Err(e) => self.status = Some(e.to_string()),
        }
        self.reload();
    }

    /// Deletes the currently selected task or category.
    pub fn delete_selected(&mut self) {
        match self.view_mode {
            ViewMode::Tasks => {
                if let Some(id) = self.selected_task().map(|t| t.id.clone()) {
                    let result = cmd_remove(self.repo, &id, true);
                    self.report(result);
                }
            }
            ViewMode::Categories => {
                let name = self.category_state.selected().and_then(|i| self.categories.get(i)).map(|c| c.name.clone());
                if let Some(name) = name {
                    let result = cmd_category_remove(self.repo, &name, true);
                    self.report(result);
                }
            }
        }
        self.reload();
    }

    /// Reloads tasks and categories from storage and refreshes the display list.
    pub fn reload(&mut self) {
        match self.repo.load() {
            Ok(tasks) => self.all_tasks = tasks,
            Err(e) => self.status = Some(e.to_string()),
        }
        let opts = ListOptions { all: self.show_completed, ..Default::default() };
        self.tasks = list_tasks(self.all_tasks.clone(), &opts);
        match self.repo.load_categories() {
            Ok(registry) => self.categories = registry.into_vec(),
            Err(e) => self.status = Some(e.to_string()),
        }

        clamp_selection(&mut self.state, self.tasks.len());
        clamp_selection(&mut self.category_state, self.categories.len());
    }

    /// Number of tasks, completed included, filed under category `name`.
    pub fn category_usage(&self, name: &str) -> usize {
        usage_count(name, &self.all_tasks)
    }

    /// Toggles the visibility of completed tasks.
    pub fn toggle_completed(&mut self) {
        self.show_completed = !self.show_completed;
        self.reload();
    }

    /// Toggles between Task and Category views.
    pub fn toggle_view(&mut self) {
        self.view_mode = match self.view_mode {
            ViewMode::Tasks => ViewMode::Categories,
            ViewMode::Categories => ViewMode::Tasks,
        };
    }

    /// Initiates the "Add" wizard for the current view.
    pub fn start_add(&mut self) {
        self.input_mode = InputMode::Adding;
        self.add_state = AddState::default();
        self.input_buffer.clear();
        self.status = None;
    }

    /// Initiates editing of a specific field for the selected task.
    pub fn start_edit(&mut self, field: InputField) {
        let Some(t) = self.selected_task() else { return };
        let id = t.id.clone();
        let buffer = match field {
            InputField::Name => t.name.clone(),
            InputField::NextDate => t.next_date.map(|d| d.to_string()).unwrap_or_default(),
            InputField::Every => t.periodicity.short().to_string(),
            InputField::Cost => t.cost.map(|c| c.to_string()).unwrap_or_default(),
            InputField::None => String::new(),
        };
        self.target_id = Some(id);
        self.input_mode = InputMode::Editing;
        self.input_field = field;
        self.input_buffer = buffer;
        self.status = None;
    }

    /// Handles text input based on the current mode.
    pub fn handle_input(&mut self) {
        match self.input_mode {
            InputMode::Adding => self.handle_adding_input(),
            InputMode::Editing => self.handle_editing_input(),
            InputMode::Normal => {}
        }
    }

    pub fn cancel_input(&mut self) {
        self.input_mode = InputMode::Normal;
        self.input_buffer.clear();
    }

    fn finish_input(&mut self, result: Result<()>) {
        self.report(result);
        self.input_mode = InputMode::Normal;
        self.input_buffer.clear();
        self.reload();
    }

    /// Handles input for the "Add" wizard.
    fn handle_adding_input(&mut self) {
        let value = self.input_buffer.trim().to_string();
        if self.view_mode == ViewMode::Categories {
            if !value.is_empty() {
                let result = cmd_category_add(self.repo, value, None, None, true);
                self.finish_input(result);
            }
            return;
        }

        match self.add_state.step {
            0 => { // Name
                if value.is_empty() { return; }
                self.add_state.name = value;
            }
            1 => { // Category
                if value.is_empty() { return; }
                self.add_state.category = value;
            }
            2 => { // Last date, defaults to today
                self.add_state.last_date = if value.is_empty() { self.today().to_string() } else { value };
            }
            3 => { // Every
                self.add_state.every = (!value.is_empty()).then_some(value);
            }
            4 => { // Cost
                let cost = if value.is_empty() {
                    None
                } else {
                    match value.parse::<f64>() {
                        Ok(c) => Some(c),
                        Err(_) => {
                            self.status = Some(format!("Invalid cost '{}'", value));
                            return;
                        }
                    }
                };
                let input = TaskInput {
                    name: self.add_state.name.clone(),
                    category: self.add_state.category.clone(),
                    last_date: self.add_state.last_date.clone(),
                    periodicity: self.add_state.every.clone(),
                    cost,
                    notifications: true,
                    ..Default::default()
                };
                let result = cmd_add(self.repo, input, true).map(|_| ());
                self.finish_input(result);
                return;
            }
            _ => return,
        }
        self.add_state.step += 1;
        self.input_buffer.clear();
    }

    /// Handles input for the "Edit Task" mode.
    fn handle_editing_input(&mut self) {
        let Some(id) = self.target_id.clone() else { return };
        let value = self.input_buffer.trim().to_string();
        let edit = match self.input_field {
            InputField::Name => TaskEdit { name: Some(value), ..Default::default() },
            InputField::NextDate => TaskEdit { next_date: Some(value), ..Default::default() },
            InputField::Every => TaskEdit { periodicity: Some(value), ..Default::default() },
            InputField::Cost => match value.parse::<f64>() {
                Ok(c) => TaskEdit { cost: Some(c), ..Default::default() },
                Err(_) => {
                    self.status = Some(format!("Invalid cost '{}'", value));
                    return;
                }
            },
            InputField::None => TaskEdit::default(),
        };
        let result = cmd_edit(self.repo, &id, edit, true);
        self.finish_input(result);
    }
}

fn clamp_selection(state: &mut TableState, len: usize) {
    if len == 0 {
        state.select(None);
    } else if let Some(i) = state.selected() {
        if i >= len {
            state.select(Some(len - 1));
        }
    } else {
        state.select(Some(0));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryRepository;

    fn type_line(app: &mut App, line: &str) {
        app.input_buffer = line.to_string();
        app.handle_input();
    }

    #[test]
    fn add_wizard_creates_recurring_task() {
        let repo = MemoryRepository::default();
        let mut app = App::new(&repo);
        app.start_add();
        type_line(&mut app, "Air filter");
        type_line(&mut app, "house");
        type_line(&mut app, "2024-01-10");
        type_line(&mut app, "3m");
        type_line(&mut app, "15");

        assert!(app.input_mode == InputMode::Normal);
        assert_eq!(app.tasks.len(), 1);
        let t = &app.tasks[0];
        assert_eq!(t.category, "House");
        assert_eq!(t.next_date, NaiveDate::from_ymd_opt(2024, 4, 10));
        assert_eq!(t.cost, Some(15.0));
    }

    #[test]
    fn completing_selection_hides_it_and_shows_successor() {
        let repo = MemoryRepository::default();
        let mut app = App::new(&repo);
        app.start_add();
        for line in ["Oil", "Vehicle", "2024-01-01", "1y", ""] {
            type_line(&mut app, line);
        }
        let original = app.tasks[0].id.clone();
        app.complete_selected();

        assert_eq!(app.all_tasks.len(), 2);
        assert_eq!(app.tasks.len(), 1);
        assert_ne!(app.tasks[0].id, original);
        assert!(app.status.as_deref().unwrap_or_default().contains("2026-01-01"));
    }

    #[test]
    fn removing_used_category_reports_error() {
        let repo = MemoryRepository::default();
        let mut app = App::new(&repo);
        app.start_add();
        for line in ["Oil", "Vehicle", "", "", ""] {
            type_line(&mut app, line);
        }
        app.toggle_view();
        app.category_state.select(Some(0));
        app.delete_selected();
        assert_eq!(app.categories.len(), 5);
        assert!(app.status.is_some());
    }

    #[test]
    fn completing_a_completed_task_says_so() {
        let repo = MemoryRepository::default();
        let mut app = App::new(&repo);
        app.start_add();
        for line in ["Bulb", "House", "2024-01-01", "", ""] {
            type_line(&mut app, line);
        }
        app.complete_selected();
        assert_eq!(app.status.as_deref(), Some("Completed."));
        assert!(app.tasks.is_empty());

        app.toggle_completed();
        app.state.select(Some(0));
        app.complete_selected();
        assert_eq!(app.status.as_deref(), Some("Task is already completed."));
        assert_eq!(app.all_tasks.len(), 1);
    }

    #[test]
    fn category_usage_ignores_case_and_padding() {
        let repo = MemoryRepository::default();
        let mut app = App::new(&repo);
        app.start_add();
        for line in ["Oil", "Vehicle", "", "", ""] {
            type_line(&mut app, line);
        }
        let mut tasks = repo.load().unwrap();
        tasks[0].category = " vehicle ".into();
        repo.save(&tasks).unwrap();
        app.reload();

        assert_eq!(app.category_usage("Vehicle"), 1);
        assert_eq!(app.category_usage("House"), 0);
    }
}
