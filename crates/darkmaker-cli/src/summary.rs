use console::Style;
use darkmaker_core::session::config::{InputDisposition, OutputTarget, SessionConfig};

struct Styles {
    title: Style,
    label: Style,
    value: Style,
    method: Style,
    disabled: Style,
    path: Style,
}

impl Styles {
    fn new() -> Self {
        Self {
            title: Style::new().cyan().bold(),
            label: Style::new().dim(),
            value: Style::new().bold().white(),
            method: Style::new().green(),
            disabled: Style::new().dim().yellow(),
            path: Style::new().underlined(),
        }
    }
}

pub fn print_session_summary(config: &SessionConfig, file_count: usize) {
    let s = Styles::new();

    println!();
    println!("  {}", s.title.apply_to("Master Dark Session"));
    println!();

    println!(
        "  {:<14}{}",
        s.label.apply_to("Inputs"),
        s.value.apply_to(format!("{file_count} files"))
    );
    let (label, path) = match &config.output {
        OutputTarget::File(p) => ("Output", p),
        OutputTarget::Directory(p) => ("Output dir", p),
    };
    println!(
        "  {:<14}{}",
        s.label.apply_to(label),
        s.path.apply_to(path.display())
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Method"),
        s.method.apply_to(&config.method)
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Calibration"),
        s.method.apply_to(&config.calibration)
    );

    let grouping = &config.grouping;
    if grouping.is_grouped() {
        let mut stages = Vec::new();
        if grouping.by_size {
            stages.push("size".to_string());
        }
        if grouping.by_exposure {
            stages.push(format!("exposure ±{}", grouping.exposure_tolerance));
        }
        if grouping.by_temperature {
            stages.push(format!("temperature ±{}", grouping.temperature_tolerance));
        }
        println!(
            "  {:<14}{}",
            s.label.apply_to("Grouping"),
            s.value.apply_to(stages.join(", "))
        );
    } else {
        println!(
            "  {:<14}{}",
            s.label.apply_to("Grouping"),
            s.disabled.apply_to("disabled")
        );
    }

    if let InputDisposition::SubFolder { name_template } = &config.disposition {
        println!(
            "  {:<14}{}",
            s.label.apply_to("Move inputs"),
            s.path.apply_to(name_template)
        );
    }
    if config.ignore_file_type {
        println!(
            "  {:<14}{}",
            s.label.apply_to("Frame type"),
            s.disabled.apply_to("not checked")
        );
    }
    println!();
}
