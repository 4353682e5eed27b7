use std::io::Write;
use std::time::Duration;

use anyhow::Result;
use colored::{ColoredString, Colorize};
use streetgrid_mdp::{CellReport, TrafficClass};

use crate::run::{RunOutcome, SolvedRun};

fn arrow(cell: &CellReport) -> char {
    cell.action.map_or('★', |action| action.arrow())
}

fn paint(text: String, traffic: TrafficClass) -> ColoredString {
    match traffic {
        TrafficClass::Low => text.green(),
        TrafficClass::Medium => text.yellow(),
        TrafficClass::High => text.red(),
    }
}

fn route_text(run: &SolvedRun) -> String {
    run.route
        .iter()
        .map(|cell| format!("({},{})", cell.x, cell.y))
        .collect::<Vec<_>>()
        .join(" → ")
}

pub fn generate_console_report(
    out: &mut dyn Write,
    outcomes: &[RunOutcome],
    verbose: bool,
    total_duration: Duration,
) -> Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", "📊 Value Iteration Summary".bright_cyan().bold())?;
    writeln!(out, "{}", "==========================".cyan())?;

    let solved = outcomes.iter().filter(|o| o.is_solved()).count();
    writeln!(out, "Seeds: {}", outcomes.len())?;
    writeln!(out, "Solved: {}", solved.to_string().green())?;
    writeln!(out, "Failed: {}", (outcomes.len() - solved).to_string().red())?;
    writeln!(out, "Total time: {total_duration:?}")?;
    writeln!(out)?;

    for outcome in outcomes {
        match outcome {
            RunOutcome::Solved(run) => write_console_run(out, run, verbose)?,
            RunOutcome::Failed { seed, error } => {
                writeln!(out, "{} seed {}", "❌ FAIL".red(), seed.to_string().bold())?;
                writeln!(out, "   {}", error.red())?;
                writeln!(out)?;
            }
        }
    }
    Ok(())
}

fn write_console_run(out: &mut dyn Write, run: &SolvedRun, verbose: bool) -> Result<()> {
    writeln!(out, "{} seed {}", "✅ SOLVED".green(), run.seed.to_string().bold())?;
    writeln!(
        out,
        "   Sweeps: {} (final residual {:.6})",
        run.sweeps, run.final_residual
    )?;
    writeln!(
        out,
        "   Expected delay from ({},{}): {:.3}",
        run.start.x, run.start.y, run.expected_delay
    )?;
    writeln!(out, "   Route: {}", route_text(run))?;
    if verbose {
        for (idx, residual) in run.residuals.iter().enumerate() {
            writeln!(out, "     sweep {:>4}: {residual:.6}", idx + 1)?;
        }
    }
    writeln!(out)?;

    for row in run.grid.rows() {
        let mut line = String::from("   ");
        for cell in row {
            let text = format!("{} {:>7.2}", arrow(cell), cell.value);
            line.push_str(&paint(text, cell.traffic).to_string());
            line.push(' ');
        }
        writeln!(out, "{}", line.trim_end())?;
    }
    writeln!(out)?;
    Ok(())
}

pub fn generate_json_report(out: &mut dyn Write, outcomes: &[RunOutcome]) -> Result<()> {
    let json_output = serde_json::to_string_pretty(outcomes)?;
    writeln!(out, "{json_output}")?;
    Ok(())
}

pub fn generate_markdown_report(out: &mut dyn Write, outcomes: &[RunOutcome]) -> Result<()> {
    writeln!(out, "# Street Grid Value Iteration\n")?;

    let solved = outcomes.iter().filter(|o| o.is_solved()).count();
    writeln!(out, "## Summary\n")?;
    writeln!(out, "- **Seeds**: {}", outcomes.len())?;
    writeln!(out, "- **Solved**: {solved}")?;
    writeln!(out, "- **Failed**: {}\n", outcomes.len() - solved)?;

    for outcome in outcomes {
        match outcome {
            RunOutcome::Solved(run) => {
                writeln!(out, "### ✅ Seed {}\n", run.seed)?;
                writeln!(out, "- **Sweeps**: {}", run.sweeps)?;
                writeln!(out, "- **Final residual**: {:.6}", run.final_residual)?;
                writeln!(out, "- **Expected delay**: {:.3}", run.expected_delay)?;
                writeln!(out, "- **Route**: {}\n", route_text(run))?;

                let size = run.grid.size;
                write!(out, "| y \\ x |")?;
                for x in 0..size {
                    write!(out, " {x} |")?;
                }
                writeln!(out)?;
                writeln!(out, "|---|{}", "---|".repeat(size))?;
                for (offset, row) in run.grid.rows().enumerate() {
                    write!(out, "| {} |", size - 1 - offset)?;
                    for cell in row {
                        write!(
                            out,
                            " {} {:.2} ({}) |",
                            arrow(cell),
                            cell.value,
                            cell.traffic.label()
                        )?;
                    }
                    writeln!(out)?;
                }
                writeln!(out)?;
            }
            RunOutcome::Failed { seed, error } => {
                writeln!(out, "### ❌ Seed {seed}\n")?;
                writeln!(out, "- **Error**: {error}\n")?;
            }
        }
    }
    Ok(())
}

pub fn generate_csv_report(out: &mut dyn Write, outcomes: &[RunOutcome]) -> Result<()> {
    writeln!(out, "seed,x,y,traffic,parameter,value,action")?;
    for outcome in outcomes {
        let RunOutcome::Solved(run) = outcome else {
            continue;
        };
        for cell in &run.grid.cells {
            writeln!(
                out,
                "{},{},{},{},{},{},{}",
                run.seed,
                cell.x,
                cell.y,
                cell.traffic.label(),
                cell.parameter,
                cell.value,
                cell.action.map_or("", |a| a.label())
            )?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use streetgrid_mdp::{Action, Cell, GridReport};

    fn sample_run() -> SolvedRun {
        let cells = vec![
            CellReport {
                x: 0,
                y: 0,
                traffic: TrafficClass::Low,
                parameter: 0.9,
                value: -0.22,
                action: Some(Action::Right),
            },
            CellReport {
                x: 0,
                y: 1,
                traffic: TrafficClass::High,
                parameter: 0.5,
                value: -0.11,
                action: Some(Action::Right),
            },
            CellReport {
                x: 1,
                y: 0,
                traffic: TrafficClass::Medium,
                parameter: 0.7,
                value: -0.11,
                action: Some(Action::Up),
            },
            CellReport {
                x: 1,
                y: 1,
                traffic: TrafficClass::Low,
                parameter: 0.9,
                value: 0.0,
                action: None,
            },
        ];
        SolvedRun {
            seed: 42,
            sweeps: 10,
            final_residual: 0.0,
            residuals: vec![0.1, 0.0],
            start: Cell::new(0, 0),
            route: vec![Cell::new(0, 0), Cell::new(1, 0), Cell::new(1, 1)],
            expected_delay: 0.22,
            grid: GridReport { size: 2, cells },
        }
    }

    fn render(f: impl FnOnce(&mut dyn Write) -> Result<()>) -> String {
        let mut buf = Vec::new();
        f(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn csv_lists_every_cell() {
        let outcomes = vec![
            RunOutcome::Solved(sample_run()),
            RunOutcome::Failed {
                seed: 7,
                error: "boom".to_string(),
            },
        ];
        let csv = render(|out| generate_csv_report(out, &outcomes));
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[0], "seed,x,y,traffic,parameter,value,action");
        assert_eq!(lines[1], "42,0,0,low,0.9,-0.22,right");
        assert!(lines[4].ends_with(','));
    }

    #[test]
    fn json_tags_outcomes() {
        let outcomes = vec![
            RunOutcome::Solved(sample_run()),
            RunOutcome::Failed {
                seed: 7,
                error: "boom".to_string(),
            },
        ];
        let json = render(|out| generate_json_report(out, &outcomes));
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value[0]["status"], "solved");
        assert_eq!(value[0]["grid"]["cells"].as_array().unwrap().len(), 4);
        assert_eq!(value[0]["grid"]["cells"][0]["action"], "Right");
        assert_eq!(value[1]["status"], "failed");
        assert_eq!(value[1]["error"], "boom");
    }

    #[test]
    fn markdown_draws_top_row_first() {
        let outcomes = vec![RunOutcome::Solved(sample_run())];
        let md = render(|out| generate_markdown_report(out, &outcomes));
        assert!(md.contains("### ✅ Seed 42"));
        let top = md.find("\n| 1 |").unwrap();
        let bottom = md.find("\n| 0 |").unwrap();
        assert!(top < bottom);
        assert!(md.contains("★ 0.00 (low)"));
    }

    #[test]
    fn console_report_mentions_route() {
        colored::control::set_override(false);
        let outcomes = vec![RunOutcome::Solved(sample_run())];
        let text = render(|out| {
            generate_console_report(out, &outcomes, true, Duration::from_millis(5))
        });
        assert!(text.contains("Route: (0,0) → (1,0) → (1,1)"));
        assert!(text.contains("sweep    2: 0.000000"));
    }
}
