//! Status helper enums mapping to SMALLINT lookup tables.
//!
//! Each enum variant's discriminant matches the seed data order (1-based)
//! in the corresponding `*_statuses` database table.

/// Status ID type matching SMALLINT/SMALLSERIAL in the database.
pub type StatusId = i16;

macro_rules! define_status_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident = $val:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[repr(i16)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum $name {
            $( $(#[$vmeta])* $variant = $val ),+
        }

        impl $name {
            /// Return the database status ID.
            pub fn id(self) -> StatusId {
                self as StatusId
            }

            /// Look up a variant by its database status ID.
            pub fn from_id(id: StatusId) -> Option<Self> {
                match id {
                    $( $val => Some(Self::$variant), )+
                    _ => None,
                }
            }
        }

        impl From<$name> for StatusId {
            fn from(value: $name) -> Self {
                value as StatusId
            }
        }
    };
}

define_status_enum! {
    /// Simulation job lifecycle status.
    SimJobStatus {
        Pending = 1,
        Running = 2,
        Completed = 3,
        Failed = 4,
    }
}

impl SimJobStatus {
    /// Lowercase name as stored in `sim_job_statuses.name`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    /// Whether a job in `self` may move to `next`.
    ///
    /// ```text
    /// pending   -> running      claimed by the worker
    /// running   -> completed    driver produced a report URL
    /// running   -> failed       driver raised a typed failure
    /// pending   -> completed    completion gateway (manual run)
    /// completed -> completed    completion gateway, idempotent
    /// failed    -> completed    completion gateway, run finished by hand
    /// ```
    pub fn can_transition_to(self, next: Self) -> bool {
        use SimJobStatus::*;
        matches!(
            (self, next),
            (Pending, Running)
                | (Running, Completed)
                | (Running, Failed)
                | (Pending, Completed)
                | (Completed, Completed)
                | (Failed, Completed)
        )
    }
}

/// Statuses from which the completion gateway may mark a job completed.
pub const COMPLETABLE_STATUSES: [StatusId; 4] = [
    SimJobStatus::Pending as StatusId,
    SimJobStatus::Running as StatusId,
    SimJobStatus::Completed as StatusId,
    SimJobStatus::Failed as StatusId,
];
