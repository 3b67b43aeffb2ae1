pub type Result<T> = std::result::Result<T, Error>;

/// Closed classification of domain errors, used by the REST boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    AlreadyExists,
    NotFound,
    PermissionDenied,
    EmptyResult,
    UpstreamFailure,
    InvalidCredentials,
    Internal,
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    // Enrollment errors
    #[error("The user you specified is already enrolled.")]
    UserAlreadyEnrolled,
    #[error("The user you specified is not enrolled.")]
    UserNotEnrolled,
    #[error("The user you specified does not have permission to enroll in this course.")]
    NoEnrollmentPermission,
    // Subscription errors
    #[error("The user you specified is already subscribed.")]
    UserAlreadySubscribed,
    #[error("The user you specified is not subscribed.")]
    UserNotSubscribed,
    #[error("The Subscription type you specified does not exist.")]
    SubTypeNotFound,
    // Course errors
    #[error("The course you specified does not exist.")]
    CourseNotFound,
    #[error("The course you specified has no students.")]
    NoStudentsInCourse,
    #[error("The user you specified is not enrolled in any course.")]
    StudentNotEnrolled,
    // User directory errors
    #[error("Invalid credentials.")]
    InvalidCredentials,
    // Collaborator errors
    #[error("Payment error.")]
    PaymentRejected {
        status: u16,
        detail: serde_json::Value,
    },
    #[error("Failed to reach collaborator service: {0}")]
    Collaborator(#[from] reqwest::Error),
    #[error("Failed to {action} after a failed payment")]
    CompensationFailed {
        action: &'static str,
        #[source]
        source: Box<Error>,
    },
    // Storage errors
    #[error("Record {0} vanished inside its own transaction")]
    RecordNotFound(String),
    #[error(transparent)]
    DatabaseError(#[from] sqlx::Error),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UserAlreadyEnrolled | Self::UserAlreadySubscribed => ErrorKind::AlreadyExists,
            Self::UserNotEnrolled
            | Self::UserNotSubscribed
            | Self::SubTypeNotFound
            | Self::CourseNotFound => ErrorKind::NotFound,
            Self::NoEnrollmentPermission => ErrorKind::PermissionDenied,
            Self::NoStudentsInCourse | Self::StudentNotEnrolled => ErrorKind::EmptyResult,
            Self::PaymentRejected { .. } | Self::Collaborator(_) => ErrorKind::UpstreamFailure,
            Self::InvalidCredentials => ErrorKind::InvalidCredentials,
            Self::CompensationFailed { .. } | Self::RecordNotFound(_) | Self::DatabaseError(_) => {
                ErrorKind::Internal
            }
        }
    }
}
