use breathe_core::{Config, Exercise, PhasePattern, Result};
use serde::Serialize;

#[derive(Serialize)]
struct PatternInfo {
    exercise: &'static str,
    label: &'static str,
    phases: Vec<PhaseInfo>,
    cycle_secs: f64,
    breaths_per_minute: f64,
}

#[derive(Serialize)]
struct PhaseInfo {
    name: &'static str,
    secs: f64,
}

fn describe(exercise: Exercise, pattern: &PhasePattern) -> PatternInfo {
    PatternInfo {
        exercise: exercise.as_str(),
        label: exercise.label(),
        phases: pattern
            .phases()
            .iter()
            .map(|p| PhaseInfo {
                name: p.kind.as_str(),
                secs: p.duration().as_secs_f64(),
            })
            .collect(),
        cycle_secs: pattern.cycle_duration().as_secs_f64(),
        breaths_per_minute: pattern.breaths_per_minute(),
    }
}

pub fn run(json: bool) -> Result<()> {
    let config = Config::load()?;
    let mut infos = Vec::new();
    for exercise in Exercise::ALL {
        let pattern = config.pattern_for(exercise)?;
        infos.push(describe(exercise, &pattern));
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&infos)?);
        return Ok(());
    }

    for info in &infos {
        let phases = info
            .phases
            .iter()
            .map(|p| format!("{} {}s", p.name, p.secs))
            .collect::<Vec<_>>()
            .join(" / ");
        println!(
            "{:<7} {:<17} {}  ({}s per cycle, {:.1} breaths/min)",
            info.exercise, info.label, phases, info.cycle_secs, info.breaths_per_minute
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn describe_four_seven_eight() {
        let info = describe(Exercise::FourSevenEight, &PhasePattern::four_seven_eight());
        assert_eq!(info.exercise, "4-7-8");
        let names: Vec<_> = info.phases.iter().map(|p| p.name).collect();
        assert_eq!(names, vec!["Inhale", "Hold", "Exhale"]);
        assert_eq!(info.cycle_secs, 19.0);
    }
}
