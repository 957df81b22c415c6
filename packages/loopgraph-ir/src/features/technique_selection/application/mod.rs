//! Technique Selection Application Layer
//!
//! `select_technique()` tries DOALL, then HELIX, then DSWP, skipping the
//! disabled ones. The first legal technique wins.

use crate::config::Verbosity;
use crate::features::technique_selection::domain::{
    DisqualifyingReason, Legality, Technique, TechniqueDecision, TechniqueVerdict,
};
use crate::features::technique_selection::infrastructure::{
    DoallSelector, DswpSelector, HelixSelector, SelectionContext,
};
use tracing::{debug, info};

pub fn select_technique(ctx: &SelectionContext<'_>) -> TechniqueDecision {
    let mut decision = TechniqueDecision {
        chosen: None,
        verdicts: Vec::new(),
        doall: None,
        dswp: None,
        helix: None,
    };

    let order = [
        (Technique::Doall, ctx.config.enable_doall),
        (Technique::Helix, ctx.config.enable_helix),
        (Technique::Dswp, ctx.config.enable_dswp),
    ];
    for (technique, enabled) in order {
        if !enabled {
            continue;
        }
        let legality = match technique {
            Technique::Doall => DoallSelector::new().legality(ctx),
            Technique::Helix => HelixSelector::new().legality(ctx),
            Technique::Dswp => DswpSelector::new().legality(ctx),
        };
        decision.verdicts.push(TechniqueVerdict { technique, legality });

        match legality {
            Legality::Legal => {
                match technique {
                    Technique::Doall => decision.doall = DoallSelector::new().plan(ctx),
                    Technique::Helix => decision.helix = HelixSelector::new().plan(ctx),
                    Technique::Dswp => decision.dswp = DswpSelector::new().plan(ctx),
                }
                decision.chosen = Some(technique);
                info!(
                    function = ctx.function.name(),
                    header = %ctx.lp.header,
                    %technique,
                    "technique selected"
                );
                break;
            }
            Legality::Illegal(reason) => report_rejection(ctx, technique, &reason),
        }
    }

    if decision.chosen.is_none() && ctx.verbosity != Verbosity::Disabled {
        info!(
            function = ctx.function.name(),
            header = %ctx.lp.header,
            "no technique applies"
        );
    }
    decision
}

fn report_rejection(ctx: &SelectionContext<'_>, technique: Technique, reason: &DisqualifyingReason) {
    match ctx.verbosity {
        Verbosity::Disabled => {}
        Verbosity::Minimal => {
            info!(
                function = ctx.function.name(),
                header = %ctx.lp.header,
                %technique,
                %reason,
                "technique rejected"
            );
        }
        Verbosity::Maximal => {
            info!(
                function = ctx.function.name(),
                header = %ctx.lp.header,
                %technique,
                %reason,
                "technique rejected"
            );
            if let DisqualifyingReason::BlockingScc { scc } = reason {
                if let Some(members) = ctx.sccdag.scc(*scc) {
                    let names: Vec<String> = members
                        .internal_values()
                        .iter()
                        .map(|v| ctx.function.value_name(*v))
                        .collect();
                    debug!(%scc, members = ?names, "blocking SCC members");
                }
                for edge in ctx.attrs.loop_carried_dependences(*scc) {
                    debug!(
                        %scc,
                        src = %ctx.function.value_name(edge.src),
                        dst = %ctx.function.value_name(edge.dst),
                        kind = ?edge.kind,
                        "loop-carried dependence"
                    );
                }
            }
        }
    }
}
