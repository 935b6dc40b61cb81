//! Control-plane endpoint table.

/// Logical control-plane endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Register,
    NextWorkItem,
    WorkItemProgress,
    WorkItemCompleted,
    WorkItemFailed,
    ReceiveScraperTargets,
    ReceiveScraperRecords,
    ReceiveScrapingErrors,
    ReceiveHealthCheckInfo,
    SendEmail,
    File,
    FileExists,
    ReceiveFile,
}

impl Endpoint {
    #[cfg(test)]
    const ALL: [Endpoint; 13] = [
        Endpoint::Register,
        Endpoint::NextWorkItem,
        Endpoint::WorkItemProgress,
        Endpoint::WorkItemCompleted,
        Endpoint::WorkItemFailed,
        Endpoint::ReceiveScraperTargets,
        Endpoint::ReceiveScraperRecords,
        Endpoint::ReceiveScrapingErrors,
        Endpoint::ReceiveHealthCheckInfo,
        Endpoint::SendEmail,
        Endpoint::File,
        Endpoint::FileExists,
        Endpoint::ReceiveFile,
    ];

    /// Path segment relative to the control-plane base URL.
    pub fn path(&self) -> &'static str {
        match self {
            Endpoint::Register => "register",
            Endpoint::NextWorkItem => "getNextWorkItem",
            Endpoint::WorkItemProgress => "workItemProgress",
            Endpoint::WorkItemCompleted => "workItemCompleted",
            Endpoint::WorkItemFailed => "workItemFailed",
            Endpoint::ReceiveScraperTargets => "receiveScraperTargets",
            Endpoint::ReceiveScraperRecords => "receiveScraperRecords",
            Endpoint::ReceiveScrapingErrors => "receiveScrapingErrors",
            Endpoint::ReceiveHealthCheckInfo => "receiveHealthcheckInfo",
            Endpoint::SendEmail => "sendEmail",
            Endpoint::File => "file",
            Endpoint::FileExists => "fileExists",
            Endpoint::ReceiveFile => "receiveFile",
        }
    }
}
