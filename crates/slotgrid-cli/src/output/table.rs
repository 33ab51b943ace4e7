use slotgrid_core::model::{PageStatus, ScheduleResult};

/// Display width, counting Hangul and other wide glyphs as two columns.
fn display_width(s: &str) -> usize {
    s.chars()
        .map(|c| if (c as u32) >= 0x1100 { 2 } else { 1 })
        .sum()
}

fn pad(s: &str, width: usize) -> String {
    let fill = width.saturating_sub(display_width(s));
    format!("{s}{}", " ".repeat(fill))
}

pub fn print(result: &ScheduleResult) {
    if result.slots.is_empty() {
        println!("No class slots found.");
        print_page_warnings(result);
        return;
    }

    let title_w = result
        .slots
        .iter()
        .map(|s| display_width(&s.title))
        .max()
        .unwrap_or(0)
        .max(5);
    let instr_w = result
        .slots
        .iter()
        .map(|s| s.instructor.as_deref().map_or(1, display_width))
        .max()
        .unwrap_or(0)
        .max(10);

    println!(
        "  {:<4} {:<11}  {}  {}  Room",
        "Day",
        "Time",
        pad("Title", title_w),
        pad("Instructor", instr_w)
    );
    println!("  {}", "-".repeat(4 + 1 + 11 + 2 + title_w + 2 + instr_w + 2 + 8));

    for slot in &result.slots {
        println!(
            "  {:<4} {}-{}  {}  {}  {}",
            slot.weekday.as_str(),
            slot.start,
            slot.end,
            pad(&slot.title, title_w),
            pad(slot.instructor.as_deref().unwrap_or("-"), instr_w),
            slot.room.as_deref().unwrap_or("-")
        );
    }
    println!();
    println!(
        "{} slot(s) from {} page(s)",
        result.slots.len(),
        result.pages.len()
    );
    print_page_warnings(result);
}

/// Report pages that produced nothing usable.
pub fn print_page_warnings(result: &ScheduleResult) {
    for page in &result.pages {
        match &page.status {
            PageStatus::Parsed => {}
            PageStatus::LayoutUnresolved => {
                eprintln!("  warning: page {}: grid layout could not be resolved", page.page_number)
            }
            PageStatus::Failed(reason) => {
                eprintln!("  warning: page {}: {}", page.page_number, reason)
            }
        }
    }
}
