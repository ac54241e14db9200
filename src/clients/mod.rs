pub mod github;
pub mod pip;
pub mod probe;
pub mod traits;

pub use github::GithubClient;
pub use pip::PipInstaller;
pub use probe::HttpProbe;
pub use traits::{HostingApi, IssueComment, PackageInstaller, RepositoryMetadata, UrlProbe};
