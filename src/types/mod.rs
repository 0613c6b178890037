//! Request and response types for the Valyu API.
//!
//! Request structs apply the service defaults in `new()` and omit unset
//! fields when serialized. Response structs carry an in-band
//! `success`/`error` pair and implement [`ApiResponse`].

pub mod answer;
pub mod batch;
pub mod common;
pub mod contents;
pub mod datasources;
pub mod deep_research;
pub mod search;

pub use answer::{
    AiUsage, AnswerRequest, AnswerResponse, Cost, SearchMetadata, StreamEvent, StreamMetadata,
};
pub use batch::{
    AddBatchTasksRequest, AddBatchTasksResponse, Batch, BatchCounts, BatchPagination,
    BatchStatusResponse, BatchTaskCreated, BatchTaskInput, BatchTaskListItem,
    CancelBatchResponse, CreateBatchRequest, CreateBatchResponse, ListBatchTasksOptions,
    ListBatchTasksResponse, ListBatchesResponse,
};
pub use common::{
    ApiResponse, BatchStatus, DatasourceCategoryId, DeepResearchMode, DeepResearchStatus,
    ExtractEffort, ResponseLength, SearchType,
};
pub use contents::{ContentResult, ContentsRequest, ContentsResponse};
pub use datasources::{
    Datasource, DatasourceCategory, DatasourceCoverage, DatasourcePricing,
    DatasourcesCategoriesResponse, DatasourcesListOptions, DatasourcesListResponse,
};
pub use deep_research::{
    DeepResearchAssetsResponse, DeepResearchCreateRequest, DeepResearchCreateResponse,
    DeepResearchListItem, DeepResearchListOptions, DeepResearchListResponse,
    DeepResearchSearchConfig, DeepResearchSource, DeepResearchStatusResponse,
    DeepResearchTaskResponse, DeepResearchUsage, DeliverableResult, FileAttachment,
    ImageMetadata, McpAuth, McpServerConfig, Progress,
};
pub use search::{ResultsBySource, SearchRequest, SearchResponse, SearchResult};
