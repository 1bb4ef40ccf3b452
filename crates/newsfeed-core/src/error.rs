//! Domain error taxonomy.

use snafu::Snafu;

/// Every failure the core can raise.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum CoreError {
    #[snafu(display("Newsfeed id \"{newsfeed_id}\" type is invalid"))]
    InvalidNewsfeedId { newsfeed_id: String },

    #[snafu(display("Newsfeed id \"{}...\" is too long", &newsfeed_id[..(*max_length).min(newsfeed_id.len())]))]
    NewsfeedIdTooLong { newsfeed_id: String, max_length: usize },

    #[snafu(display("Subscription of newsfeed \"{newsfeed_id}\" to itself is restricted"))]
    SelfSubscription { newsfeed_id: String },

    #[snafu(display(
        "Subscription from newsfeed \"{newsfeed_id}\" to \"{to_newsfeed_id}\" already exists"
    ))]
    SubscriptionAlreadyExists {
        newsfeed_id: String,
        to_newsfeed_id: String,
    },

    #[snafu(display(
        "Subscription \"{subscription_id}\" could not be found in newsfeed \"{newsfeed_id}\""
    ))]
    SubscriptionNotFound {
        newsfeed_id: String,
        subscription_id: uuid::Uuid,
    },

    #[snafu(display(
        "Subscription from newsfeed \"{newsfeed_id}\" to \"{to_newsfeed_id}\" could not be found"
    ))]
    SubscriptionBetweenNotFound {
        newsfeed_id: String,
        to_newsfeed_id: String,
    },

    #[snafu(display(
        "Newsfeed \"{newsfeed_id}\" could not be added to the storage because the number of \
         newsfeeds exceeds maximum {max_newsfeeds}"
    ))]
    NewsfeedLimitExceeded {
        newsfeed_id: String,
        max_newsfeeds: usize,
    },

    #[snafu(display(
        "Newsfeed \"{newsfeed_id}\" subscription could not be added because the number of \
         subscriptions exceeds maximum {max_subscriptions}"
    ))]
    SubscriptionLimitExceeded {
        newsfeed_id: String,
        max_subscriptions: usize,
    },

    #[snafu(display(
        "Newsfeed event queue can not accept message because queue size limit exceeds maximum \
         {max_size}"
    ))]
    QueueFull { max_size: usize },

    #[snafu(display(
        "Event \"{event_id}\" could not be found in newsfeed \"{newsfeed_id}\""
    ))]
    EventNotFound {
        newsfeed_id: String,
        event_id: uuid::Uuid,
    },
}

impl CoreError {
    /// True for everything the HTTP edge should answer with 400.
    ///
    /// Every variant the core can construct is a validation or domain-conflict
    /// condition raised synchronously to a caller, so this is currently always
    /// true; kept explicit because a future storage-backed variant could add
    /// a genuine 500 case.
    pub fn is_client_error(&self) -> bool {
        true
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
