//! PostgreSQL 管理工具客户端
//!
//! 浏览服务器、容器与数据库并下载 dump：
//! - 带超时与错误体解析的 HTTP 封装
//! - 可丢弃过期结果的资源状态容器
//! - 服务器 → 容器/主机 → 数据库的级联选择
//! - dump 下载与文件命名

pub mod api;
pub mod cli;
pub mod download;
pub mod endpoints;
pub mod http;
pub mod resource;
pub mod selection;
pub mod session;

pub use api::{ApiClient, ManagerApi};
pub use download::{Downloader, DumpSink, FileSink, SavedDump};
pub use http::{HttpClient, RequestOptions};
pub use resource::{FetchState, Outcome, Resource, Staged};
pub use selection::{DatabaseScope, DumpTarget, Scope, Selection, SelectionEvent};
pub use session::Session;
