//! Parallelization plan: the output contract consumed by code generation

use super::loop_content::LoopContent;
use crate::errors::Result;
use crate::features::scc_classifier::domain::{LoopGoverningIvAttribution, SccType};
use crate::features::scc_dag::domain::SccId;
use crate::features::technique_selection::domain::{
    DoallPlan, DswpPlan, HelixPlan, SequentialSegment, Stage, Technique, TechniqueDecision,
    TechniqueVerdict,
};
use crate::shared::models::{BlockId, LoopId, ValueId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SccSummary {
    pub id: SccId,
    pub scc_type: SccType,
    pub is_clonable: bool,
    pub is_reducible: bool,
    pub is_induction_variable: bool,
    pub members: Vec<ValueId>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentSummary {
    /// Producer of every environment slot, live-ins first
    pub producers: Vec<ValueId>,
    pub live_ins: Vec<usize>,
    pub live_outs: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoopPlan {
    pub loop_id: LoopId,
    pub header: BlockId,
    pub nesting_level: u32,
    pub technique: Option<Technique>,
    pub verdicts: Vec<TechniqueVerdict>,
    pub sccs: Vec<SccSummary>,
    pub stages: Vec<Stage>,
    pub governing_iv: Option<LoopGoverningIvAttribution>,
    pub environment: EnvironmentSummary,
    pub doall: Option<DoallPlan>,
    pub dswp: Option<DswpPlan>,
    pub helix: Option<HelixPlan>,
    pub estimated_savings: f64,
    pub selected: bool,
}

impl LoopPlan {
    pub fn from_content(content: &LoopContent<'_>, decision: TechniqueDecision, savings: f64) -> Self {
        let sccs = content
            .sccdag
            .sccs()
            .filter_map(|(id, scc)| {
                let attrs = content.attrs.attrs(id)?;
                Some(SccSummary {
                    id,
                    scc_type: attrs.scc_type,
                    is_clonable: attrs.is_clonable,
                    is_reducible: attrs.is_reducible,
                    is_induction_variable: attrs.is_induction_variable,
                    members: scc.internal_values().to_vec(),
                })
            })
            .collect();

        let stages = match (&decision.dswp, &decision.helix) {
            (Some(dswp), _) => dswp.stages.clone(),
            (_, Some(helix)) => helix.stages.clone(),
            _ => Vec::new(),
        };

        let env = &content.environment;
        let environment = EnvironmentSummary {
            producers: (0..env.size()).filter_map(|i| env.producer(i)).collect(),
            live_ins: env.live_in_indices().collect(),
            live_outs: env.live_out_indices().collect(),
        };

        Self {
            loop_id: content.lp.id,
            header: content.lp.header,
            nesting_level: content.lp.nesting_level,
            technique: decision.chosen,
            verdicts: decision.verdicts,
            sccs,
            stages,
            governing_iv: content
                .induction_variables
                .loop_governing_iv_attribution()
                .cloned(),
            environment,
            doall: decision.doall,
            dswp: decision.dswp,
            helix: decision.helix,
            estimated_savings: savings,
            selected: false,
        }
    }

    pub fn segments(&self) -> &[SequentialSegment] {
        self.helix.as_ref().map_or(&[], |h| h.segments.as_slice())
    }
}

/// Plans for every loop of one function
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParallelizationPlan {
    pub function: String,
    pub loops: Vec<LoopPlan>,
    /// Loops worth parallelizing, best first
    pub selected_loops: Vec<LoopId>,
}

impl ParallelizationPlan {
    pub fn loop_plan(&self, id: LoopId) -> Option<&LoopPlan> {
        self.loops.iter().find(|l| l.loop_id == id)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
