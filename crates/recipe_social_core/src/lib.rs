pub mod domain;
pub mod events;
pub mod follows;
pub mod ledger;
pub mod notifications;
pub mod paths;
pub mod ports;
pub mod profiles;
pub mod ratings;
pub mod recipes;
pub mod search;

pub use domain::{
    Comment, Difficulty, InteractionCounts, ListOptions, NewComment, NewRecipe, Notification,
    Rating, RatingStats, Recipe, RecipePatch, SavedRecipe, SavedRecipePatch, UploadOptions,
    UploadResult, UploadSource, UserProfile,
};
pub use events::{EventDispatcher, EventSubscriber, InteractionEvent};
pub use follows::FollowGraph;
pub use ledger::InteractionLedger;
pub use notifications::NotificationInbox;
pub use ports::{DocumentStore, MediaStore, PortError, PortResult};
pub use profiles::ProfileDirectory;
pub use ratings::RatingAggregator;
pub use recipes::RecipeRepository;
pub use search::{DebouncedSearch, SearchBackend, SearchResults, SearchService};
