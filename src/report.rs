use std::fmt;

use serde::Serialize;

use crate::difference::{PairwiseResult, TestFamily};
use crate::error::Result;
use crate::explore::{ColumnKind, Exploration};
use crate::normality::{Aggregation, NormalityReport};
use crate::pipeline::Analysis;
use crate::verdict::TestVerdict;

fn push_line(out: &mut String, args: fmt::Arguments<'_>) {
    out.push_str(&args.to_string());
    out.push('\n');
}

fn format_p(p: f64) -> String {
    if p != 0.0 && p < 1e-4 {
        format!("{p:.3e}")
    } else {
        format!("{p:.4}")
    }
}

fn format_value(v: f64) -> String {
    if v.is_nan() {
        "-".to_string()
    } else {
        format!("{v:.4}")
    }
}

fn verdict_line(v: &TestVerdict) -> String {
    format!(
        "{}: statistic = {:.4}, p = {}",
        v.test,
        v.statistic,
        format_p(v.p_value)
    )
}

fn family_tests(family: TestFamily) -> String {
    format!("{} + {}", family.omnibus_test(), family.pairwise_test())
}

pub fn render_normality(report: &NormalityReport) -> String {
    let mut out = String::new();
    push_line(&mut out, format_args!("Normality:"));
    for g in &report.groups {
        push_line(
            &mut out,
            format_args!(
                "  {:<20} n = {:<6} {}  -> {}",
                g.label,
                g.size,
                verdict_line(&g.verdict),
                if g.is_normal() {
                    "consistent with a normal distribution"
                } else {
                    "not normally distributed"
                }
            ),
        );
    }
    let scope = match report.aggregation {
        Aggregation::AllGroups => "all groups",
        Aggregation::LastGroup => "last group",
    };
    push_line(
        &mut out,
        format_args!(
            "  Decision ({scope}): {}",
            if report.normal { "normal" } else { "not normal" }
        ),
    );
    if report.normal != report.all_normal {
        push_line(&mut out, format_args!("  Note: not every group is normal."));
    }
    out
}

pub fn render_homogeneity(verdict: &TestVerdict) -> String {
    format!(
        "Homogeneity of variance:\n  {}  -> {}\n",
        verdict_line(verdict),
        if verdict.null_rejected {
            "variances differ between groups"
        } else {
            "variances are homogeneous"
        }
    )
}

pub fn render_omnibus(verdict: &TestVerdict) -> String {
    format!(
        "Omnibus test:\n  {}  -> {}\n",
        verdict_line(verdict),
        if verdict.null_rejected {
            "at least one group differs significantly"
        } else {
            "no significant difference between groups"
        }
    )
}

pub fn render_pairwise(results: &[PairwiseResult]) -> String {
    let mut out = String::new();
    let Some(first) = results.first() else {
        return "No group pairs to compare.\n".to_string();
    };
    push_line(&mut out, format_args!("Pairwise comparisons ({}):", first.verdict.test));
    push_line(
        &mut out,
        format_args!(
            "  {:<20} {:<20} {:>12} {:>12}  {}",
            "Group A", "Group B", "Statistic", "p-value", "Verdict"
        ),
    );
    for r in results {
        push_line(
            &mut out,
            format_args!(
                "  {:<20} {:<20} {:>12.4} {:>12}  {}",
                r.group_a,
                r.group_b,
                r.verdict.statistic,
                format_p(r.verdict.p_value),
                if r.significant() {
                    "significant difference"
                } else {
                    "no significant difference"
                }
            ),
        );
    }
    out
}

pub fn render_analysis(analysis: &Analysis) -> String {
    let mut out = render_normality(&analysis.normality);
    out.push('\n');
    out.push_str(&render_homogeneity(&analysis.homogeneity));
    out.push('\n');
    push_line(
        &mut out,
        format_args!(
            "Recommended: {} ({})",
            match analysis.recommendation {
                TestFamily::Parametric => "parametric tests",
                TestFamily::NonParametric => "non-parametric tests",
            },
            family_tests(analysis.recommendation)
        ),
    );

    match analysis.executed {
        None => {
            push_line(&mut out, format_args!("No difference test was run."));
        }
        Some(family) => {
            if analysis.overrides_recommendation() {
                push_line(
                    &mut out,
                    format_args!(
                        "Warning: running {} although its assumptions were not met.",
                        family_tests(family)
                    ),
                );
            }
            if let Some(omnibus) = &analysis.omnibus {
                out.push('\n');
                out.push_str(&render_omnibus(omnibus));
            }
            out.push('\n');
            out.push_str(&render_pairwise(&analysis.pairwise));
        }
    }
    out
}

pub fn render_exploration(e: &Exploration) -> String {
    let mut out = String::new();
    push_line(&mut out, format_args!("{} records, {} columns", e.rows, e.columns));
    push_line(&mut out, format_args!("Duplicate records: {}", e.duplicates));

    let missing: Vec<_> = e.columns_with_missing().collect();
    if missing.is_empty() {
        push_line(&mut out, format_args!("No missing values."));
    } else {
        push_line(&mut out, format_args!("\nMissing values:"));
        for p in missing {
            push_line(&mut out, format_args!("  {:<25} {:>6.2}%", p.name, p.missing_percent));
        }
    }

    push_line(&mut out, format_args!("\nColumn kinds:"));
    for p in &e.profiles {
        let kind = match p.kind {
            ColumnKind::Numeric => "numeric",
            ColumnKind::Categorical => "categorical",
        };
        push_line(&mut out, format_args!("  {:<25} {kind}", p.name));
    }

    for p in e.profiles.iter().filter(|p| !p.top_values.is_empty()) {
        push_line(&mut out, format_args!("\nMost frequent values of {}:", p.name));
        for v in &p.top_values {
            push_line(&mut out, format_args!("  {:<25} {}", v.value, v.count));
        }
    }

    for g in &e.groups {
        push_line(&mut out, format_args!("\nGroup {} ({} records)", g.label, g.rows));
        if !g.numeric.is_empty() {
            push_line(
                &mut out,
                format_args!(
                    "  {:<20} {:>6} {:>10} {:>10} {:>10} {:>10} {:>10} {:>10} {:>10}",
                    "column", "count", "mean", "std", "min", "25%", "50%", "75%", "max"
                ),
            );
            for s in &g.numeric {
                push_line(
                    &mut out,
                    format_args!(
                        "  {:<20} {:>6} {:>10} {:>10} {:>10} {:>10} {:>10} {:>10} {:>10}",
                        s.column,
                        s.count,
                        format_value(s.mean),
                        format_value(s.std),
                        format_value(s.min),
                        format_value(s.q1),
                        format_value(s.median),
                        format_value(s.q3),
                        format_value(s.max),
                    ),
                );
            }
        }
        if !g.categorical.is_empty() {
            push_line(
                &mut out,
                format_args!(
                    "  {:<20} {:>6} {:>6} {:<20} {:>6}",
                    "column", "count", "unique", "top", "freq"
                ),
            );
            for c in &g.categorical {
                push_line(
                    &mut out,
                    format_args!(
                        "  {:<20} {:>6} {:>6} {:<20} {:>6}",
                        c.column, c.count, c.unique, c.top, c.freq
                    ),
                );
            }
        }
    }
    out
}

pub fn print_normality(report: &NormalityReport) {
    print!("{}", render_normality(report));
}

pub fn print_homogeneity(verdict: &TestVerdict) {
    print!("{}", render_homogeneity(verdict));
}

pub fn print_omnibus(verdict: &TestVerdict) {
    print!("{}", render_omnibus(verdict));
}

pub fn print_pairwise(results: &[PairwiseResult]) {
    print!("{}", render_pairwise(results));
}

pub fn print_analysis(analysis: &Analysis) {
    print!("{}", render_analysis(analysis));
}

pub fn print_exploration(exploration: &Exploration) {
    print!("{}", render_exploration(exploration));
}

pub fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

/// Print any result type as pretty JSON.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", to_json(value)?);
    Ok(())
}
