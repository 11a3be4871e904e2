// Plain-text summaries printed at the end of a run.

use std::fmt::Write as _;

use squadcast_core::Player;
use squadcast_engine::lineup::Lineup;
use squadcast_engine::optimizer::SolveStatus;
use squadcast_engine::projection::Predictions;
use squadcast_engine::strategy::{CaptaincyPick, SquadIssue};

use crate::pipeline::{GameweekPlan, RunReport};

fn player_line(out: &mut String, player: &Player, predictions: &Predictions, captaincy: Option<&CaptaincyPick>) {
    let marker = match captaincy {
        Some(c) if c.captain.player_id == player.id() => if c.triple_captain { " (TC)" } else { " (C)" },
        Some(c) if c.vice_captain.as_ref().is_some_and(|v| v.player_id == player.id()) => " (V)",
        _ => "",
    };
    let _ = writeln!(
        out,
        "  {:<3} {:<20} {:>7}  {:>5.1} pts{marker}",
        player.position(),
        player.name,
        player.price().to_string(),
        predictions.get(&player.id()).copied().unwrap_or(0.0),
    );
}

fn lineup_section(out: &mut String, lineup: &Lineup, predictions: &Predictions, captaincy: Option<&CaptaincyPick>) {
    let _ = writeln!(out, "Starting XI ({}), projected {:.1}:", lineup.formation, lineup.projected_points);
    for player in &lineup.starters {
        player_line(out, player, predictions, captaincy);
    }
    let _ = writeln!(out, "Bench:");
    for player in &lineup.bench {
        player_line(out, player, predictions, captaincy);
    }
}

pub fn render_initial(report: &RunReport) -> String {
    let mut out = String::new();
    let squad = &report.solution.squad;
    let gameweek = report.gameweek.map_or_else(|| "-".to_string(), |gw| gw.to_string());

    let _ = writeln!(
        out,
        "Squad for gameweek {gameweek}: {} spent, {:.1}m left, objective {:.1} from {} candidates",
        squad.spent(),
        squad.remaining_budget(),
        report.solution.objective,
        report.candidates,
    );
    if report.solution.status == SolveStatus::TimeLimited {
        let _ = writeln!(out, "Note: solver hit its time limit; the squad is valid but may not be optimal.");
    }
    if report.history_failures > 0 {
        let _ = writeln!(
            out,
            "Note: history unavailable for {} players; they were scored without it.",
            report.history_failures
        );
    }
    lineup_section(&mut out, &report.lineup, &report.predictions, report.captaincy.as_ref());
    out
}

fn issue_line(issue: &SquadIssue, plan: &GameweekPlan) -> String {
    let name = plan
        .squad
        .get(issue.player_id())
        .map_or_else(|| format!("#{}", issue.player_id()), |p| p.name.clone());
    match issue {
        SquadIssue::Unavailable { news, .. } if news.is_empty() => format!("{name}: unavailable"),
        SquadIssue::Unavailable { news, .. } => format!("{name}: unavailable ({news})"),
        SquadIssue::Doubtful { chance, .. } => format!("{name}: {chance}% chance of playing"),
        SquadIssue::PoorForm { form, .. } => format!("{name}: poor form ({form:.1})"),
        SquadIssue::PriceDrop { change, .. } => format!("{name}: price down {change:.1}m"),
    }
}

pub fn render_plan(plan: &GameweekPlan) -> String {
    let mut out = String::new();
    let gameweek = plan.gameweek.map_or_else(|| "-".to_string(), |gw| gw.to_string());
    let _ = writeln!(out, "Plan for gameweek {gameweek}");

    if !plan.issues.is_empty() {
        let _ = writeln!(out, "Squad issues:");
        for issue in &plan.issues {
            let _ = writeln!(out, "  {}", issue_line(issue, plan));
        }
    }

    match &plan.chip {
        Some(chip) => {
            let _ = writeln!(
                out,
                "Chip: play {} (confidence {:.0}%, benefit {:.1}): {}",
                chip.chip,
                chip.confidence * 100.0,
                chip.expected_benefit,
                chip.reasons.join("; ")
            );
        }
        None => {
            let _ = writeln!(out, "Chip: none");
        }
    }

    if plan.transfers.transfers.is_empty() {
        let _ = writeln!(out, "Transfers: none");
    } else {
        let _ = writeln!(
            out,
            "Transfers ({} hits, net gain {:.1}):",
            plan.transfers.hits, plan.transfers.net_gain
        );
        for t in &plan.transfers.transfers {
            let _ = writeln!(
                out,
                "  {} -> {} ({:+.1}m, {})",
                t.outgoing.name, t.incoming.name, t.price_change, t.reason
            );
        }
    }
    let planned: Vec<_> = plan.transfers.transfers.iter().map(|t| t.outgoing.id()).collect();
    for cover in plan.injury_cover.iter().filter(|c| !planned.contains(&c.outgoing.id())) {
        let _ = writeln!(out, "  consider {} -> {} ({})", cover.outgoing.name, cover.incoming.name, cover.reason);
    }

    lineup_section(&mut out, &plan.lineup, &plan.predictions, plan.captaincy.as_ref());
    let _ = writeln!(out, "Free transfers next gameweek: {}", plan.free_transfers_next);
    out
}
