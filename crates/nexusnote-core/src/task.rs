use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::error::NexusError;

/// Workflow status of a task. Clicking advances to the next value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub enum TaskStatus {
    #[default]
    #[serde(rename = "Not Started")]
    NotStarted,
    #[serde(rename = "In Progress")]
    InProgress,
    Waiting,
    Done,
    Deferred,
}

impl TaskStatus {
    /// Cycle order
    pub const ALL: [TaskStatus; 5] = [
        TaskStatus::NotStarted,
        TaskStatus::InProgress,
        TaskStatus::Waiting,
        TaskStatus::Done,
        TaskStatus::Deferred,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            TaskStatus::NotStarted => "Not Started",
            TaskStatus::InProgress => "In Progress",
            TaskStatus::Waiting => "Waiting",
            TaskStatus::Done => "Done",
            TaskStatus::Deferred => "Deferred",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.label() == label)
    }

    pub fn next(self) -> Self {
        cycle(&Self::ALL, self)
    }
}

/// Task priority. Clicking advances to the next value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub enum TaskPriority {
    High,
    #[default]
    Medium,
    Low,
}

impl TaskPriority {
    /// Cycle order
    pub const ALL: [TaskPriority; 3] = [TaskPriority::High, TaskPriority::Medium, TaskPriority::Low];

    pub fn label(&self) -> &'static str {
        match self {
            TaskPriority::High => "High",
            TaskPriority::Medium => "Medium",
            TaskPriority::Low => "Low",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.label() == label)
    }

    pub fn next(self) -> Self {
        cycle(&Self::ALL, self)
    }
}

fn cycle<T: Copy + PartialEq>(values: &[T], current: T) -> T {
    let index = values.iter().position(|v| *v == current).unwrap_or(0);
    values[(index + 1) % values.len()]
}

// Stored lists may carry unknown labels or omit the field entirely
impl<'de> Deserialize<'de> for TaskStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = Option::<String>::deserialize(deserializer)?;
        Ok(label
            .as_deref()
            .and_then(TaskStatus::from_label)
            .unwrap_or_default())
    }
}

impl<'de> Deserialize<'de> for TaskPriority {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = Option::<String>::deserialize(deserializer)?;
        Ok(label
            .as_deref()
            .and_then(TaskPriority::from_label)
            .unwrap_or_default())
    }
}

/// A single row of a task block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub priority: TaskPriority,
    /// Free-form date text as typed by the user
    #[serde(default)]
    pub due_date: String,
    #[serde(default)]
    pub approved: bool,
}

impl Task {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            text: String::new(),
            completed: false,
            status: TaskStatus::default(),
            priority: TaskPriority::default(),
            due_date: String::new(),
            approved: false,
        }
    }
}

impl Default for Task {
    fn default() -> Self {
        Self::new()
    }
}

/// Payload of a task block. Every edit yields the whole list for persisting.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskListContent {
    pub tasks: Vec<Task>,
}

impl TaskListContent {
    pub fn new(tasks: Vec<Task>) -> Self {
        Self { tasks }
    }

    pub fn get(&self, task_id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == task_id)
    }

    /// Append an empty task and return its id
    pub fn add_task(&mut self) -> String {
        let task = Task::new();
        let id = task.id.clone();
        self.tasks.push(task);
        id
    }

    pub fn remove_task(&mut self, task_id: &str) -> Result<Task, NexusError> {
        let index = self
            .tasks
            .iter()
            .position(|t| t.id == task_id)
            .ok_or_else(|| NexusError::TaskNotFound(task_id.to_string()))?;
        Ok(self.tasks.remove(index))
    }

    pub fn set_text(&mut self, task_id: &str, text: impl Into<String>) -> Result<(), NexusError> {
        self.task_mut(task_id)?.text = text.into();
        Ok(())
    }

    pub fn set_due_date(&mut self, task_id: &str, due: impl Into<String>) -> Result<(), NexusError> {
        self.task_mut(task_id)?.due_date = due.into();
        Ok(())
    }

    pub fn toggle_completed(&mut self, task_id: &str) -> Result<bool, NexusError> {
        let task = self.task_mut(task_id)?;
        task.completed = !task.completed;
        Ok(task.completed)
    }

    pub fn toggle_approved(&mut self, task_id: &str) -> Result<bool, NexusError> {
        let task = self.task_mut(task_id)?;
        task.approved = !task.approved;
        Ok(task.approved)
    }

    pub fn cycle_status(&mut self, task_id: &str) -> Result<TaskStatus, NexusError> {
        let task = self.task_mut(task_id)?;
        task.status = task.status.next();
        Ok(task.status)
    }

    pub fn cycle_priority(&mut self, task_id: &str) -> Result<TaskPriority, NexusError> {
        let task = self.task_mut(task_id)?;
        task.priority = task.priority.next();
        Ok(task.priority)
    }

    /// Number of completed tasks
    pub fn completed_count(&self) -> usize {
        self.tasks.iter().filter(|t| t.completed).count()
    }

    fn task_mut(&mut self, task_id: &str) -> Result<&mut Task, NexusError> {
        self.tasks
            .iter_mut()
            .find(|t| t.id == task_id)
            .ok_or_else(|| NexusError::TaskNotFound(task_id.to_string()))
    }
}
