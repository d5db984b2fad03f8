use crate::data::{persistence::get_data_dir, AppSettings, FileStore, ToastQueue};
use crate::session::Session;
use crate::ui::leave_table::{run_app, App};
use crate::ui::{restore_terminal, setup_terminal};
use anyhow::Result;
use chrono::{Datelike, Local};
use tracing::info;

pub fn run(year: i32) -> Result<()> {
    let data_dir = get_data_dir()?;
    let toasts = ToastQueue::default();
    let settings = AppSettings::load_or_default(&data_dir, &toasts);
    info!(dir = %data_dir.display(), year, "opening leave calendar");

    let session = Session::load(
        Box::new(FileStore::new(data_dir)),
        Box::new(toasts.clone()),
        settings,
        year,
        Local::now().year(),
    );

    // Install panic hook to restore terminal on panic
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = crossterm::terminal::disable_raw_mode();
        let _ = crossterm::execute!(
            std::io::stdout(),
            crossterm::terminal::LeaveAlternateScreen
        );
        original_hook(info);
    }));

    let mut terminal = setup_terminal()?;

    let today = Local::now().date_naive();
    let mut app = App::new(session, toasts, today);
    let result = run_app(&mut terminal, &mut app);

    restore_terminal(&mut terminal)?;
    info!("leave calendar closed");
    result
}
