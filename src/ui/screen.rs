use ratatui::Frame;

use crate::{
    app::{App, AppState},
    ui::calendar::render_calendar,
};

/// A UI Screen boundary: one per app state
pub trait Screen {
    fn render(&self, app: &App, f: &mut Frame);
}

/// Board, keyboard and stats; also the no-puzzle placeholder
pub struct GameScreen;

impl Screen for GameScreen {
    fn render(&self, app: &App, f: &mut Frame) {
        f.render_widget(app, f.area());
    }
}

/// Month view for picking an archive date
pub struct CalendarScreen;

impl Screen for CalendarScreen {
    fn render(&self, app: &App, f: &mut Frame) {
        render_calendar(app, f);
    }
}

pub fn current_screen(state: AppState) -> Box<dyn Screen> {
    match state {
        AppState::Playing | AppState::NoPuzzle => Box::new(GameScreen),
        AppState::Calendar => Box::new(CalendarScreen),
    }
}
