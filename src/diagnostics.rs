//! Diagnostic rendering for type errors.

use ariadne::{Color, ColorGenerator, Config, Fmt, Label, Report, ReportKind, Source};

use crate::error::{InferError, TypeError};
use crate::infer::{Registry, TypeEnv};
use crate::types::PrettyContext;

fn paint(text: &str, color: Color, enabled: bool) -> String {
    if enabled {
        text.fg(color).to_string()
    } else {
        text.to_string()
    }
}

/// Render a type error against its source text.
///
/// Types are printed through `registry` and `env`, so variables carry their
/// display names and declared types their user-facing names.
pub fn render_error(
    filename: &str,
    source: &str,
    error: &InferError,
    registry: &Registry,
    env: &TypeEnv,
    color: bool,
) -> String {
    let span = error.span();
    let range = span.start..span.end;
    let mut ctx = PrettyContext::new().with_registry(registry).with_env(env);

    let mut report = Report::build(ReportKind::Error, (filename, range.clone()))
        .with_config(Config::default().with_color(color));

    match &error.kind {
        // Mismatches get expected/found wording in two colors
        TypeError::Mismatch { left, right } => {
            let mut colors = ColorGenerator::new();
            let expected_color = colors.next();
            let found_color = colors.next();
            let expected = ctx.format_type(right);
            let found = ctx.format_type(left);

            let msg = format!(
                "Type mismatch: {} '{}', {} '{}'",
                paint("expected", expected_color, color),
                expected,
                paint("found", found_color, color),
                found
            );
            report = report.with_message(&msg).with_label(
                Label::new((filename, range))
                    .with_message(&msg)
                    .with_color(Color::Red),
            );
            report.add_note(format!(
                "Cannot unify {} '{}' with {} '{}'",
                paint("expected", expected_color, color),
                expected,
                paint("found", found_color, color),
                found
            ));
        }

        kind => {
            let (message, note) = describe(kind, &mut ctx);
            report = report.with_message(&message).with_label(
                Label::new((filename, range))
                    .with_message(&message)
                    .with_color(Color::Red),
            );
            if let Some(note_text) = note {
                report.add_help(note_text);
            }
        }
    }

    let mut out = Vec::new();
    if report
        .finish()
        .write((filename, Source::from(source)), &mut out)
        .is_err()
    {
        return error.to_string();
    }
    String::from_utf8_lossy(&out).into_owned()
}

/// Print a type error with colored diagnostics to stderr.
pub fn print_error(
    filename: &str,
    source: &str,
    error: &InferError,
    registry: &Registry,
    env: &TypeEnv,
) {
    eprintln!();
    eprint!("{}", render_error(filename, source, error, registry, env, true));
    eprintln!();
}

fn describe(kind: &TypeError, ctx: &mut PrettyContext<'_>) -> (String, Option<String>) {
    match kind {
        TypeError::Cyclic { var, ty } => (
            format!(
                "Infinite type: {} occurs in {}",
                ctx.format_type(var),
                ctx.format_type(ty)
            ),
            Some("This would create an infinite type".to_string()),
        ),
        TypeError::BindingConflict {
            var,
            existing,
            attempted,
        } => (
            format!(
                "Internal error: {} is bound to {} and cannot be rebound to {}",
                ctx.format_type(var),
                ctx.format_type(existing),
                ctx.format_type(attempted)
            ),
            Some("This is a defect in the type checker, not in the program".to_string()),
        ),
        TypeError::UnknownVariable { var } => (
            format!("Internal error: unknown type variable {}", ctx.format_type(var)),
            Some("This is a defect in the type checker, not in the program".to_string()),
        ),
        TypeError::ConstructorArity {
            constructor,
            expected,
            found,
        } => (
            kind.to_string(),
            Some(match (expected, found) {
                (0, _) => format!("{} takes no argument", constructor),
                (_, 0) => format!("{} needs an argument", constructor),
                _ => format!(
                    "{} takes a tuple of {} components, not {}",
                    constructor, expected, found
                ),
            }),
        ),
        TypeError::UnboundTypeVariable { .. } => (
            kind.to_string(),
            Some("Type declarations may only use their own parameters".to_string()),
        ),
        _ => (kind.to_string(), None),
    }
}
