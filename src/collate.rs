use std::collections::{BTreeMap, HashMap};

use log::warn;

use crate::config::ScorecardFailurePolicy;
use crate::error::CollateError;
use crate::report::{
    ApplicationData, CandidateData, CollatedRecord, FormattedScorecard, QuestionAnswer, Report,
};
use crate::schema::{Candidate, Offer, Scorecard, name_of};

/// Keys candidates by id. A later record with the same id replaces
/// an earlier one.
pub fn index_candidates(candidates: Vec<Candidate>) -> HashMap<u64, Candidate> {
    candidates.into_iter().map(|c| (c.id, c)).collect()
}

/// Reduces a scorecard to the reported fields.
pub fn format_scorecard(scorecard: &Scorecard) -> FormattedScorecard {
    FormattedScorecard {
        created_at: scorecard.created_at.clone(),
        interview: scorecard.interview.clone(),
        interview_step: name_of(&scorecard.interview_step),
        submitted_by: name_of(&scorecard.submitted_by),
        interviewer: name_of(&scorecard.interviewer),
        overall_recommendation: scorecard.overall_recommendation.clone(),
        attributes: scorecard.attributes.clone(),
        ratings: scorecard.ratings.clone(),
        questions: scorecard
            .questions
            .iter()
            .map(|q| QuestionAnswer {
                question: q.question.clone(),
                answer: q.answer.clone(),
            })
            .collect(),
    }
}

/// Joins every offer with its candidate, application and scorecards.
///
/// CONTRACT:
/// - Exactly one record per offer id (a repeated offer id keeps the last)
/// - Unknown candidate or application is a hard error
/// - An application missing from `scorecards` is reported with no
///   scorecards under `Tolerate`, and is an error under `Abort`
pub fn collate(
    offers: &[Offer],
    candidates: &HashMap<u64, Candidate>,
    scorecards: &HashMap<u64, Vec<Scorecard>>,
    policy: ScorecardFailurePolicy,
) -> Result<Report, CollateError> {
    let mut report = Report::new();

    for offer in offers {
        let candidate = candidates
            .get(&offer.candidate_id)
            .ok_or(CollateError::CandidateNotFound {
                offer_id: offer.id,
                candidate_id: offer.candidate_id,
            })?;

        let application = candidate.application(offer.application_id).ok_or(
            CollateError::ApplicationNotFound {
                offer_id: offer.id,
                candidate_id: offer.candidate_id,
                application_id: offer.application_id,
            },
        )?;

        let scorecards_data = match (scorecards.get(&offer.application_id), policy) {
            (Some(cards), _) => cards.iter().map(format_scorecard).collect(),
            (None, ScorecardFailurePolicy::Tolerate) => {
                warn!(
                    "Offer {}: no scorecards available for application {}, reporting none",
                    offer.id, offer.application_id
                );
                Vec::new()
            }
            (None, ScorecardFailurePolicy::Abort) => {
                return Err(CollateError::MissingScorecards {
                    offer_id: offer.id,
                    application_id: offer.application_id,
                });
            }
        };

        let record = CollatedRecord {
            candidate_name: candidate.full_name(),
            candidate_data: CandidateData {
                company: candidate.company.clone(),
                title: candidate.title.clone(),
                created_at: candidate.created_at.clone(),
                recruiter_name: name_of(&candidate.recruiter),
            },
            application_id: offer.application_id,
            application_data: ApplicationData {
                source: application.source.as_ref().and_then(|s| s.public_name.clone()),
                credited_to: name_of(&application.credited_to),
                jobs: application.jobs.iter().map(|j| j.name.clone()).collect(),
                prospective_department: application.prospective_department.clone(),
            },
            scorecards_data,
        };

        if report.insert(offer.id, record).is_some() {
            warn!("Offer {} appeared more than once; keeping the last copy", offer.id);
        }
    }

    Ok(report)
}

/// Candidates holding more than one accepted offer, as
/// `(display name, offer count)`, ordered by candidate id.
///
/// Candidates missing from `candidates` are named by id.
pub fn candidates_with_multiple_offers(
    offers: &[Offer],
    candidates: &HashMap<u64, Candidate>,
) -> Vec<(String, usize)> {
    let mut counts: BTreeMap<u64, usize> = BTreeMap::new();
    for offer in offers {
        *counts.entry(offer.candidate_id).or_default() += 1;
    }

    counts
        .into_iter()
        .filter(|(_, n)| *n > 1)
        .map(|(id, n)| {
            let name = candidates
                .get(&id)
                .map(Candidate::full_name)
                .unwrap_or_else(|| format!("candidate {id}"));
            (name, n)
        })
        .collect()
}
