//! crates/kidsmart_core/src/view.rs
//!
//! Which screen is showing. A single `Navigator` owns the current `AppView`;
//! everything else reads it and asks the navigator to move.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TeacherTool {
    #[default]
    Menu,
    StoryCreator,
    LessonPlanner,
    FlashcardMaker,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum KidActivity {
    #[default]
    Menu,
    StoryTime,
    GameQuiz,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AppView {
    #[default]
    Home,
    Teacher(TeacherTool),
    Kid(KidActivity),
}

/// What the caller must do after `Navigator::back`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackEffect {
    None,
    /// A teacher tool was left: drop unsaved work, stop speech, zero timers.
    ResetTeacherWorkspace,
}

#[derive(Debug, Default)]
pub struct Navigator {
    view: AppView,
}

impl Navigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view(&self) -> AppView {
        self.view
    }

    pub fn enter_teacher(&mut self) {
        self.view = AppView::Teacher(TeacherTool::Menu);
    }

    pub fn enter_kid_zone(&mut self) {
        self.view = AppView::Kid(KidActivity::Menu);
    }

    /// Opens a teacher tool; ignored outside the teacher workspace.
    pub fn open_tool(&mut self, tool: TeacherTool) -> bool {
        match self.view {
            AppView::Teacher(_) => {
                self.view = AppView::Teacher(tool);
                true
            }
            _ => false,
        }
    }

    /// Opens a kid activity; ignored outside the kid zone.
    pub fn open_activity(&mut self, activity: KidActivity) -> bool {
        match self.view {
            AppView::Kid(_) => {
                self.view = AppView::Kid(activity);
                true
            }
            _ => false,
        }
    }

    /// One level up: tool or activity → its menu, menu → home.
    pub fn back(&mut self) -> BackEffect {
        match self.view {
            AppView::Home => BackEffect::None,
            AppView::Teacher(TeacherTool::Menu) | AppView::Kid(KidActivity::Menu) => {
                self.view = AppView::Home;
                BackEffect::None
            }
            AppView::Teacher(_) => {
                self.view = AppView::Teacher(TeacherTool::Menu);
                BackEffect::ResetTeacherWorkspace
            }
            AppView::Kid(_) => {
                self.view = AppView::Kid(KidActivity::Menu);
                BackEffect::None
            }
        }
    }
}
