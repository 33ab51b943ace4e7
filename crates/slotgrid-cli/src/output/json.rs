use slotgrid_core::error::ScheduleError;
use slotgrid_core::model::ScheduleResult;

pub fn print(result: &ScheduleResult) -> Result<(), ScheduleError> {
    let json = serde_json::to_string_pretty(result)?;
    println!("{json}");
    Ok(())
}
