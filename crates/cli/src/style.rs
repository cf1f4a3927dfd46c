use std::time::Duration;

use colored::*;

/// Get a consistent color for a task name
pub fn task_color(task: &str) -> Color {
    let hash = task
        .bytes()
        .fold(0u64, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u64));

    // Label colors that stay clear of the green/red/yellow used for states
    let colors = [
        Color::TrueColor { r: 147, g: 112, b: 219 },
        Color::TrueColor { r: 64, g: 224, b: 208 },
        Color::TrueColor { r: 255, g: 140, b: 0 },
        Color::TrueColor { r: 199, g: 21, b: 133 },
        Color::TrueColor { r: 72, g: 209, b: 204 },
        Color::TrueColor { r: 138, g: 43, b: 226 },
    ];

    colors[(hash % colors.len() as u64) as usize]
}

pub fn task_label(task: &str) -> ColoredString {
    task.color(task_color(task)).bold()
}

pub fn elapsed(duration: Duration) -> String {
    if duration.as_secs() >= 1 {
        format!("{:.1}s", duration.as_secs_f64())
    } else {
        format!("{}ms", duration.as_millis())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_color_is_stable() {
        assert_eq!(task_color("sourceJar"), task_color("sourceJar"));
    }

    #[test]
    fn test_elapsed_formatting() {
        assert_eq!(elapsed(Duration::from_millis(250)), "250ms");
        assert_eq!(elapsed(Duration::from_millis(1500)), "1.5s");
    }
}
