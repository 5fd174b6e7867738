//! Plain-text tables for terminal output.

use std::fmt::{self, Write};

use crate::aggregate::RunResult;
use crate::robustness::RobustnessRow;
use crate::social_roi::RoiReport;
use crate::sweep::SweepResult;
use crate::trace::TraceRow;

const RULE_WIDTH: usize = 78;

fn rule(out: &mut String) -> fmt::Result {
    writeln!(out, "{}", "-".repeat(RULE_WIDTH))
}

fn render(body: impl FnOnce(&mut String) -> fmt::Result) -> String {
    let mut out = String::new();
    body(&mut out).expect("writing to a String cannot fail");
    out
}

fn percent(value: f64) -> String {
    format!("{:.1}%", value * 100.0)
}

pub fn render_run(result: &RunResult) -> String {
    render(|out| write_run(out, result))
}

fn write_run(out: &mut String, result: &RunResult) -> fmt::Result {
    writeln!(
        out,
        "fusion {}  |  {} paths  |  {}..={}",
        result.fusion.label(),
        result.paths,
        result.start_year,
        result.end_year
    )?;
    rule(out)?;
    let t = &result.terminal;
    writeln!(
        out,
        "terminal GDP   mean {:>8.1}T  median {:>8.1}T  p10 {:>8.1}T  p90 {:>8.1}T",
        t.mean, t.median, t.p10, t.p90
    )?;
    writeln!(
        out,
        "P(GDP > {:.0}T)        {:>7}",
        result.abundance_threshold,
        percent(result.probability_of_abundance)
    )?;
    writeln!(
        out,
        "below {:.0}T baseline   {:>7}",
        result.baseline_gdp,
        percent(result.below_baseline_fraction)
    )?;
    writeln!(out, "never recovered      {:>7}", percent(result.never_recovered_fraction))?;
    writeln!(out, "collapse             {:>7}", percent(result.collapse_fraction))?;
    writeln!(
        out,
        "uninterrupted growth {:>7}",
        percent(result.uninterrupted_growth_fraction)
    )?;
    writeln!(out, "median nadir year    {:>7.0}", result.median_nadir_year)?;
    match result.median_recovery_years {
        Some(years) => {
            writeln!(out, "median recovery      {years:>5.0} yr")?;
        }
        None => {
            writeln!(out, "median recovery          n/a")?;
        }
    }
    writeln!(out, "cumulative GDP       {:>9.0} T·yr", result.cumulative_gdp)?;

    if !result.sensitivity.is_empty() {
        rule(out)?;
        writeln!(out, "{:<22} {:>10}", "Spearman vs terminal", "rho")?;
        for entry in &result.sensitivity {
            let rho = entry
                .rho
                .map(|rho| format!("{rho:+.3}"))
                .unwrap_or_else(|| "n/a".to_string());
            writeln!(out, "{:<22} {:>10}", entry.factor.as_str(), rho)?;
        }
    }

    rule(out)?;
    writeln!(
        out,
        "{:>6} {:>10} {:>10} {:>10} {:>10}",
        "year", "mean", "p10", "p50", "p90"
    )?;
    for band in result.bands.iter().filter(|band| band.year % 10 == 0) {
        writeln!(
            out,
            "{:>6} {:>10.1} {:>10.1} {:>10.1} {:>10.1}",
            band.year, band.mean, band.p10, band.p50, band.p90
        )?;
    }
    if result.clamp_events > 0 {
        writeln!(out, "clamp events: {}", result.clamp_events)?;
    }
    Ok(())
}

pub fn render_sweep(sweep: &SweepResult) -> String {
    render(|out| write_sweep(out, sweep))
}

fn write_sweep(out: &mut String, sweep: &SweepResult) -> fmt::Result {
    writeln!(
        out,
        "{:<12} {:>12} {:>12} {:>10} {:>10}",
        "do(fusion)", "mean GDP", "median GDP", "P(>500T)", "collapse"
    )?;
    rule(out)?;
    for point in &sweep.points {
        let r = &point.result;
        writeln!(
            out,
            "{:<12} {:>11.0}T {:>11.0}T {:>10} {:>10}",
            point.fusion_year,
            r.terminal.mean,
            r.terminal.median,
            percent(r.probability_of_abundance),
            percent(r.collapse_fraction)
        )?;
    }
    if !sweep.gradients.is_empty() {
        rule(out)?;
        writeln!(
            out,
            "{:<12} {:>14} {:>20}",
            "midpoint", "dGDP/dyear", "cumulative/yr delay"
        )?;
        for (gradient, cost) in sweep.gradients.iter().zip(&sweep.delay_costs) {
            writeln!(
                out,
                "{:<12.1} {:>13.1}T {:>15.0} T·yr",
                gradient.midpoint, gradient.gdp_per_year, cost.cumulative_per_year
            )?;
        }
    }
    Ok(())
}

pub fn render_robustness(rows: &[RobustnessRow]) -> String {
    render(|out| write_robustness(out, rows))
}

fn write_robustness(out: &mut String, rows: &[RobustnessRow]) -> fmt::Result {
    writeln!(
        out,
        "{:<24} {:>9} {:>9} {:>9} {:>11} {:>9}",
        "Variation", "P(>500T)", "no recov", "collapse", "median GDP", "no dip"
    )?;
    rule(out)?;
    for row in rows {
        writeln!(
            out,
            "{:<24} {:>9} {:>9} {:>9} {:>10.0}T {:>9}",
            row.label,
            percent(row.abundance),
            percent(row.never_recovered),
            percent(row.collapse),
            row.median_terminal_gdp,
            percent(row.uninterrupted_growth)
        )?;
    }
    Ok(())
}

pub fn render_roi(report: &RoiReport) -> String {
    render(|out| write_roi(out, report))
}

fn write_roi(out: &mut String, report: &RoiReport) -> fmt::Result {
    let gain = &report.gain;
    writeln!(
        out,
        "acceleration window {}-{}  |  capex ${:.0}B  |  discounted to {}",
        gain.early_year,
        gain.late_year,
        report.capex_trillions * 1000.0,
        report.reference_year
    )?;
    rule(out)?;
    writeln!(
        out,
        "cumulative gain per year of acceleration {:>10.0} T·yr",
        gain.cumulative_per_year
    )?;
    writeln!(
        out,
        "terminal-only gain per year              {:>10.1} T",
        gain.terminal_per_year
    )?;
    if let Some(multiple) = gain.cumulative_multiple() {
        writeln!(out, "cumulative / terminal                    {multiple:>10.1}x")?;
    }
    rule(out)?;
    writeln!(
        out,
        "{:<12} {:>14} {:>16}  {}",
        "rate", "PV of gain", "x capex", "framework"
    )?;
    for entry in report.ladder.iter().chain(std::iter::once(&report.configured)) {
        writeln!(
            out,
            "{:<12} {:>13.1}T {:>15.0}x  {}",
            percent(entry.rate),
            entry.present_value,
            entry.capex_multiple,
            entry.label
        )?;
    }
    rule(out)?;
    match report.break_even_rate {
        Some(rate) => {
            writeln!(out, "break-even discount rate: {}", percent(rate))?;
        }
        None => {
            writeln!(out, "break-even discount rate: none in [1%, 500%]")?;
        }
    }
    Ok(())
}

pub fn render_trace(fusion_year: i32, rows: &[TraceRow]) -> String {
    render(|out| write_trace(out, fusion_year, rows))
}

fn write_trace(out: &mut String, fusion_year: i32, rows: &[TraceRow]) -> fmt::Result {
    writeln!(out, "do(fusion={fusion_year}), latent draws at prior means, no shocks")?;
    writeln!(
        out,
        "{:>6} {:>6} {:>6} {:>8} {:>6} {:>8} {:>8} {:>8} {:>7} {:>6}",
        "year", "T", "EROI", "GDP", "stab", "invest", "damage", "maint", "damp", "E/ref"
    )?;
    rule(out)?;
    for row in rows
        .iter()
        .filter(|row| row.year % 5 == 0 || row.year == rows[0].year)
    {
        writeln!(
            out,
            "{:>6} {:>6.2} {:>6.1} {:>8.1} {:>6.3} {:>8.1} {:>8.1} {:>8.1} {:>7.4} {:>6.2}",
            row.year,
            row.temperature,
            row.eroi,
            row.gdp,
            row.stability,
            row.investment,
            row.damages,
            row.maintenance,
            row.growth_dampener,
            row.eroi_ratio
        )?;
    }
    Ok(())
}
