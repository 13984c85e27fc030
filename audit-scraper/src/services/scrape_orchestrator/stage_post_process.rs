//! Stage: POST_PROCESS, then output assembly for DONE
//!
//! Structural corrections that the audit data gets wrong and no heuristic
//! can detect live here as data, applied by a pure function.

use super::{RunState, ScrapeOrchestrator};
use crate::models::{
    Degree, DegreesAwardedIndex, Division, Major, MajorRecord, Minor, ScrapeOutput,
    Specialization, SpecializationRecord,
};
use crate::types::CodeMap;

/// Specializations that are really part of a major's core requirements
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpecMerge {
    pub major_id: &'static str,
    /// Merged in this order, after the major's own requirements
    pub spec_codes: &'static [&'static str],
}

pub const SPEC_MERGES: &[SpecMerge] = &[SpecMerge {
    major_id: "BS-0KQ",
    spec_codes: &["0KQA", "0KQB"],
}];

/// Fold each merge's specializations into its major and drop them.
///
/// A merge whose major or any of whose specializations is missing is skipped
/// whole, leaving everything as it was.
pub fn apply_spec_merges(
    majors: &mut [MajorRecord],
    specializations: &mut Vec<SpecializationRecord>,
    merges: &[SpecMerge],
) {
    for merge in merges {
        let Some(major) = majors.iter_mut().find(|m| m.program.id == merge.major_id) else {
            tracing::warn!(major = merge.major_id, "Merge target major not found, skipping");
            continue;
        };

        let parts: Option<Vec<usize>> = merge
            .spec_codes
            .iter()
            .map(|code| specializations.iter().position(|s| s.program.id == *code))
            .collect();
        let Some(parts) = parts else {
            tracing::warn!(
                major = merge.major_id,
                specs = ?merge.spec_codes,
                "Merge source specialization not found, skipping"
            );
            continue;
        };

        for index in parts {
            major
                .program
                .requirements
                .extend(specializations[index].program.requirements.iter().cloned());
        }
        major
            .program
            .specs
            .retain(|code| !merge.spec_codes.contains(&code.as_str()));
        specializations.retain(|s| !merge.spec_codes.contains(&s.program.id.as_str()));

        tracing::info!(
            major = merge.major_id,
            specs = ?merge.spec_codes,
            "Merged specializations into major"
        );
    }
}

/// Degree types used by the produced majors, with their display names
pub fn degrees_awarded(majors: &[MajorRecord], degree_vocabulary: &CodeMap) -> DegreesAwardedIndex {
    majors
        .iter()
        .filter_map(|major| major.program.degree_type.as_deref())
        .map(|code| {
            let name = degree_vocabulary.get(code).cloned().unwrap_or_else(|| {
                tracing::warn!(degree = code, "Degree missing from vocabulary, using code as name");
                code.to_string()
            });
            (code.to_string(), name)
        })
        .collect()
}

impl ScrapeOrchestrator {
    pub(super) fn stage_post_process(&self, mut state: RunState) -> ScrapeOutput {
        apply_spec_merges(&mut state.majors, &mut state.specializations, SPEC_MERGES);
        self.assemble(state)
    }

    fn assemble(&self, state: RunState) -> ScrapeOutput {
        let mut degrees: Vec<Degree> = degrees_awarded(&state.majors, &state.vocabularies.degrees)
            .into_iter()
            .map(|(id, name)| Degree {
                division: Division::of_degree_name(&name),
                id,
                name,
            })
            .collect();

        let mut majors: Vec<Major> = state
            .majors
            .into_iter()
            .map(|record| Major {
                id: record.program.id,
                degree_id: record.triplet.degree,
                code: record.program.code,
                name: record.program.name,
                requirements: record.program.requirements,
                specs: record.program.specs,
                college: record.college_id,
            })
            .collect();

        let mut minors: Vec<Minor> = state
            .minors
            .into_iter()
            .map(|program| Minor {
                id: program.id,
                name: program.name,
                requirements: program.requirements,
            })
            .collect();

        let mut specializations: Vec<Specialization> = state
            .specializations
            .into_iter()
            .map(|record| Specialization {
                major_id: record.parent.major_id(),
                id: record.program.id,
                name: record.program.name,
                requirements: record.program.requirements,
            })
            .collect();

        let mut school_requirements = state.school_requirements;
        let mut college_requirements = state.colleges;

        school_requirements.sort_by(|a, b| a.id.cmp(&b.id));
        degrees.sort_by(|a, b| a.id.cmp(&b.id));
        majors.sort_by(|a, b| a.id.cmp(&b.id));
        minors.sort_by(|a, b| a.id.cmp(&b.id));
        specializations.sort_by(|a, b| a.id.cmp(&b.id));
        college_requirements.sort_by(|a, b| a.id.cmp(&b.id));

        ScrapeOutput {
            run_id: self.run.run_id,
            catalog_year: self.api.catalog_year(),
            generated_at: audit_common::time::now(),
            school_requirements,
            degrees,
            majors,
            minors,
            specializations,
            college_requirements,
        }
    }
}
