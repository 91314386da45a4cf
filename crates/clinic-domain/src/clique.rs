//! Sibling clique maintenance
//!
//! Siblinghood is transitive: if A and B are siblings and B and C are
//! siblings, then A and C are too. The store keeps that explicit by holding
//! every pair of a family as a symmetric pair of directed edges, so each
//! family is a complete graph. [`CliqueMaintainer`] is the only writer of
//! those edges and keeps three invariants after every completed call:
//!
//! - symmetry: (a, b) is stored iff (b, a) is stored
//! - no self-loops: (a, a) is never stored
//! - completeness: `neighbors(p) ∪ {p}` is pairwise linked for every p
//!
//! Preconditions are checked before the first write, so a rejected call
//! leaves the edge set as it found it. Atomicity of the writes themselves is
//! the caller's transaction's job.

use crate::error::SiblingError;
use crate::relationship::SiblingEdge;
use crate::traits::{PatientDirectory, RelationshipStore, SiblingBackend};
use crate::PatientId;
use std::collections::BTreeSet;
use std::fmt;

/// Error type of the store behind a maintainer
pub type StoreErrorOf<S> = <S as RelationshipStore>::Error;

/// Result of a maintainer operation over store `S`
pub type CliqueResult<S, T> = Result<T, SiblingError<StoreErrorOf<S>>>;

/// Applies link/unlink requests to a sibling edge store
///
/// Borrows the store for the duration of one logical operation; callers
/// wrap it in their own transaction.
///
/// # Examples
///
/// ```
/// use clinic_domain::{CliqueMaintainer, MemoryStore, PatientId};
///
/// let (a, b, c) = (PatientId::new(), PatientId::new(), PatientId::new());
/// let mut store = MemoryStore::with_patients([a, b, c]);
///
/// let mut maintainer = CliqueMaintainer::new(&mut store);
/// maintainer.link(a, b).unwrap();
/// maintainer.link(b, c).unwrap();
///
/// // c joined b's family, which already contained a
/// assert!(maintainer.siblings(a).unwrap().contains(&c));
/// ```
pub struct CliqueMaintainer<'s, S> {
    store: &'s mut S,
}

impl<'s, S: SiblingBackend> CliqueMaintainer<'s, S> {
    /// Wrap a store
    pub fn new(store: &'s mut S) -> Self {
        Self { store }
    }

    /// Other siblings of `patient` (the clique without the patient itself)
    pub fn siblings(&self, patient: PatientId) -> CliqueResult<S, BTreeSet<PatientId>> {
        self.require_patient(patient)?;
        self.store.neighbors(patient).map_err(SiblingError::Store)
    }

    /// The full family of `patient`, including the patient
    pub fn clique(&self, patient: PatientId) -> CliqueResult<S, BTreeSet<PatientId>> {
        self.require_patient(patient)?;
        self.group(patient)
    }

    /// Insert both directions between `x` and `y`, skipping halves that
    /// already exist. Returns the number of directed edges written.
    pub fn create_sibling_link(&mut self, x: PatientId, y: PatientId) -> CliqueResult<S, usize> {
        let mut created = 0;
        for edge in [SiblingEdge::new(x, y), SiblingEdge::new(y, x)] {
            if !self
                .store
                .edge_exists(edge.patient, edge.sibling)
                .map_err(SiblingError::Store)?
            {
                self.store
                    .insert_edge(edge.patient, edge.sibling)
                    .map_err(SiblingError::Store)?;
                created += 1;
            }
        }
        Ok(created)
    }

    /// Make `new_member` a sibling of `patient` and of everyone in
    /// `patient`'s family.
    ///
    /// If `new_member` already has a family of its own the two families are
    /// merged, so the result is still one complete clique. Re-issuing a link
    /// that already took effect writes nothing. Returns the number of
    /// directed edges written.
    pub fn link(&mut self, patient: PatientId, new_member: PatientId) -> CliqueResult<S, usize> {
        if patient == new_member {
            return Err(SiblingError::InvalidOperation(format!(
                "patient {} cannot be linked to itself",
                patient
            )));
        }
        self.require_patient(patient)?;

        let mut group = self.group(patient)?;
        group.extend(self.store.neighbors(new_member).map_err(SiblingError::Store)?);
        group.insert(new_member);

        let members: Vec<PatientId> = group.into_iter().collect();
        let mut created = 0;
        for (i, &x) in members.iter().enumerate() {
            for &y in &members[i + 1..] {
                created += self.create_sibling_link(x, y)?;
            }
        }
        Ok(created)
    }

    /// Bulk ingestion for a newly registered patient: link it to every id in
    /// `initial` (and so to their families).
    ///
    /// All ids are validated before anything is written: a self reference is
    /// `InvalidOperation`, an unknown id is `NotFound`.
    pub fn link_all(&mut self, patient: PatientId, initial: &[PatientId]) -> CliqueResult<S, usize> {
        self.require_patient(patient)?;
        for &sibling in initial {
            if sibling == patient {
                return Err(SiblingError::InvalidOperation(format!(
                    "patient {} cannot be listed as its own sibling",
                    patient
                )));
            }
            self.require_patient(sibling)?;
        }

        let mut created = 0;
        for &sibling in initial {
            created += self.link(patient, sibling)?;
        }
        Ok(created)
    }

    /// Detach `member` from `patient`'s family.
    ///
    /// Edges among the remaining members stay as they are. Unlinking a
    /// patient from itself, or from someone outside its family, changes
    /// nothing. Returns the number of directed edges removed.
    pub fn unlink(&mut self, patient: PatientId, member: PatientId) -> CliqueResult<S, usize> {
        self.require_patient(patient)?;
        if patient == member {
            return Ok(0);
        }

        let group = self.group(patient)?;
        let mut removed = 0;
        for other in group.into_iter().filter(|&m| m != member) {
            for edge in [SiblingEdge::new(other, member), SiblingEdge::new(member, other)] {
                if self
                    .store
                    .edge_exists(edge.patient, edge.sibling)
                    .map_err(SiblingError::Store)?
                {
                    self.store
                        .delete_edge(edge.patient, edge.sibling)
                        .map_err(SiblingError::Store)?;
                    removed += 1;
                }
            }
        }
        Ok(removed)
    }

    /// Cascading cleanup for a patient that is being deleted.
    ///
    /// Removes every edge mentioning `patient`. The rest of the family stays
    /// complete without any recomputation.
    pub fn remove_patient(&mut self, patient: PatientId) -> CliqueResult<S, usize> {
        self.store
            .delete_edges_touching(patient)
            .map_err(SiblingError::Store)
    }

    fn require_patient(&self, id: PatientId) -> CliqueResult<S, ()> {
        if self.store.contains_patient(id).map_err(SiblingError::Store)? {
            Ok(())
        } else {
            Err(SiblingError::NotFound(id))
        }
    }

    fn group(&self, patient: PatientId) -> CliqueResult<S, BTreeSet<PatientId>> {
        let mut group = self.store.neighbors(patient).map_err(SiblingError::Store)?;
        group.insert(patient);
        Ok(group)
    }
}

/// A broken invariant found by [`audit`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvariantViolation {
    /// Edge (a, a)
    SelfLoop(PatientId),

    /// Edge present without its reverse
    Asymmetric(SiblingEdge),

    /// Two members of one family are not linked
    Incomplete(SiblingEdge),
}

impl fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvariantViolation::SelfLoop(id) => write!(f, "patient {} is listed as their own sibling", id),
            InvariantViolation::Asymmetric(edge) => write!(
                f,
                "{} lists {} as a sibling but not the other way round",
                edge.patient, edge.sibling
            ),
            InvariantViolation::Incomplete(edge) => write!(
                f,
                "{} and {} share a family but are not linked",
                edge.patient, edge.sibling
            ),
        }
    }
}

/// Check symmetry, self-loops and completeness for every patient in `ids`.
///
/// Returns an empty list for a well-formed edge set.
pub fn audit<S, I>(store: &S, ids: I) -> Result<Vec<InvariantViolation>, S::Error>
where
    S: RelationshipStore,
    I: IntoIterator<Item = PatientId>,
{
    let mut violations = Vec::new();
    for patient in ids {
        let neighbors = store.neighbors(patient)?;
        for &sibling in &neighbors {
            let edge = SiblingEdge::new(patient, sibling);
            if edge.is_self_loop() {
                violations.push(InvariantViolation::SelfLoop(patient));
                continue;
            }
            let back = edge.reversed();
            if !store.edge_exists(back.patient, back.sibling)? {
                violations.push(InvariantViolation::Asymmetric(edge));
            }
            for &other in &neighbors {
                if other != sibling && other != patient && !store.edge_exists(sibling, other)? {
                    violations.push(InvariantViolation::Incomplete(SiblingEdge::new(sibling, other)));
                }
            }
        }
    }
    Ok(violations)
}
