//! Diagnostic message lookup for update agent error codes.
//!
//! The classifier consults a `MessageTable` when turning a failing code into a
//! human-readable message. `UpdateAgentMessages` is the built-in table for the
//! Windows Update Agent code space; any other lookup can be plugged in.

use std::collections::HashMap;

/// External lookup from a numeric error code to a message.
pub trait MessageTable: Send + Sync {
    /// The message for `code`, or `None` if the table has no entry.
    fn lookup(&self, code: i32) -> Option<&str>;
}

impl MessageTable for HashMap<i32, String> {
    fn lookup(&self, code: i32) -> Option<&str> {
        self.get(&code).map(String::as_str)
    }
}

const fn hr(code: u32) -> i32 {
    code as i32
}

pub const WU_S_SERVICE_STOP: i32 = hr(0x0024_0001);
pub const WU_S_SELFUPDATE: i32 = hr(0x0024_0002);
pub const WU_S_UPDATE_ERROR: i32 = hr(0x0024_0003);
pub const WU_S_MARKED_FOR_DISCONNECT: i32 = hr(0x0024_0004);
pub const WU_S_REBOOT_REQUIRED: i32 = hr(0x0024_0005);
pub const WU_S_ALREADY_INSTALLED: i32 = hr(0x0024_0006);
pub const WU_S_ALREADY_UNINSTALLED: i32 = hr(0x0024_0007);
pub const WU_S_ALREADY_DOWNLOADED: i32 = hr(0x0024_0008);
pub const WU_S_UH_INSTALLSTILLPENDING: i32 = hr(0x0024_2015);

pub const WU_E_NO_SERVICE: i32 = hr(0x8024_0001);
pub const WU_E_MAX_CAPACITY_REACHED: i32 = hr(0x8024_0002);
pub const WU_E_UNKNOWN_ID: i32 = hr(0x8024_0003);
pub const WU_E_NOT_INITIALIZED: i32 = hr(0x8024_0004);
pub const WU_E_RANGEOVERLAP: i32 = hr(0x8024_0005);
pub const WU_E_TOOMANYRANGES: i32 = hr(0x8024_0006);
pub const WU_E_INVALIDINDEX: i32 = hr(0x8024_0007);
pub const WU_E_ITEMNOTFOUND: i32 = hr(0x8024_0008);
pub const WU_E_OPERATIONINPROGRESS: i32 = hr(0x8024_0009);
pub const WU_E_COULDNOTCANCEL: i32 = hr(0x8024_000A);
pub const WU_E_CALL_CANCELLED: i32 = hr(0x8024_000B);
pub const WU_E_NOOP: i32 = hr(0x8024_000C);
pub const WU_E_XML_MISSINGDATA: i32 = hr(0x8024_000D);
pub const WU_E_XML_INVALID: i32 = hr(0x8024_000E);
pub const WU_E_CYCLE_DETECTED: i32 = hr(0x8024_000F);
pub const WU_E_TOO_DEEP_RELATION: i32 = hr(0x8024_0010);
pub const WU_E_INVALID_RELATIONSHIP: i32 = hr(0x8024_0011);
pub const WU_E_REG_VALUE_INVALID: i32 = hr(0x8024_0012);
pub const WU_E_DUPLICATE_ITEM: i32 = hr(0x8024_0013);
pub const WU_E_INVALID_INSTALL_REQUESTED: i32 = hr(0x8024_0014);
pub const WU_E_INSTALL_NOT_ALLOWED: i32 = hr(0x8024_0016);
pub const WU_E_NOT_APPLICABLE: i32 = hr(0x8024_0017);
pub const WU_E_NO_USERTOKEN: i32 = hr(0x8024_0018);
pub const WU_E_EXCLUSIVE_INSTALL_CONFLICT: i32 = hr(0x8024_0019);
pub const WU_E_POLICY_NOT_SET: i32 = hr(0x8024_001A);
pub const WU_E_SELFUPDATE_IN_PROGRESS: i32 = hr(0x8024_001B);
pub const WU_E_INVALID_UPDATE: i32 = hr(0x8024_001D);
pub const WU_E_SERVICE_STOP: i32 = hr(0x8024_001E);
pub const WU_E_NO_CONNECTION: i32 = hr(0x8024_001F);
pub const WU_E_NO_INTERACTIVE_USER: i32 = hr(0x8024_0020);
pub const WU_E_TIME_OUT: i32 = hr(0x8024_0021);
pub const WU_E_ALL_UPDATES_FAILED: i32 = hr(0x8024_0022);
pub const WU_E_EULAS_DECLINED: i32 = hr(0x8024_0023);
pub const WU_E_NO_UPDATE: i32 = hr(0x8024_0024);
pub const WU_E_USER_ACCESS_DISABLED: i32 = hr(0x8024_0025);
pub const WU_E_INVALID_UPDATE_TYPE: i32 = hr(0x8024_0026);
pub const WU_E_URL_TOO_LONG: i32 = hr(0x8024_0027);
pub const WU_E_UNINSTALL_NOT_ALLOWED: i32 = hr(0x8024_0028);
pub const WU_E_INVALID_PRODUCT_LICENSE: i32 = hr(0x8024_0029);
pub const WU_E_MISSING_HANDLER: i32 = hr(0x8024_002A);
pub const WU_E_LEGACYSERVER: i32 = hr(0x8024_002B);
pub const WU_E_BIN_SOURCE_ABSENT: i32 = hr(0x8024_002C);
pub const WU_E_SOURCE_ABSENT: i32 = hr(0x8024_002D);
pub const WU_E_WU_DISABLED: i32 = hr(0x8024_002E);
pub const WU_E_CALL_CANCELLED_BY_POLICY: i32 = hr(0x8024_002F);
pub const WU_E_INVALID_PROXY_SERVER: i32 = hr(0x8024_0030);
pub const WU_E_INVALID_FILE: i32 = hr(0x8024_0031);
pub const WU_E_INVALID_CRITERIA: i32 = hr(0x8024_0032);
pub const WU_E_EULA_UNAVAILABLE: i32 = hr(0x8024_0033);
pub const WU_E_DOWNLOAD_FAILED: i32 = hr(0x8024_0034);
pub const WU_E_UPDATE_NOT_PROCESSED: i32 = hr(0x8024_0035);
pub const WU_E_INVALID_OPERATION: i32 = hr(0x8024_0036);
pub const WU_E_NOT_SUPPORTED: i32 = hr(0x8024_0037);
pub const WU_E_WINHTTP_INVALID_FILE: i32 = hr(0x8024_0038);
pub const WU_E_TOO_MANY_RESYNC: i32 = hr(0x8024_0039);
pub const WU_E_NO_SERVER_CORE_SUPPORT: i32 = hr(0x8024_0040);
pub const WU_E_SYSPREP_IN_PROGRESS: i32 = hr(0x8024_0041);
pub const WU_E_UNKNOWN_SERVICE: i32 = hr(0x8024_0042);
pub const WU_E_NO_UI_SUPPORT: i32 = hr(0x8024_0043);
pub const WU_E_PER_MACHINE_UPDATE_ACCESS_DENIED: i32 = hr(0x8024_0044);
pub const WU_E_UNSUPPORTED_SEARCHSCOPE: i32 = hr(0x8024_0045);
pub const WU_E_BAD_FILE_URL: i32 = hr(0x8024_0046);
pub const WU_E_INVALID_NOTIFICATION_INFO: i32 = hr(0x8024_0048);
pub const WU_E_OUTOFRANGE: i32 = hr(0x8024_0049);
pub const WU_E_SETUP_IN_PROGRESS: i32 = hr(0x8024_004A);
pub const WU_E_UNEXPECTED: i32 = hr(0x8024_0FFF);

pub const WU_E_PT_HTTP_STATUS_BAD_REQUEST: i32 = hr(0x8024_4016);
pub const WU_E_PT_HTTP_STATUS_DENIED: i32 = hr(0x8024_4017);
pub const WU_E_PT_HTTP_STATUS_FORBIDDEN: i32 = hr(0x8024_4018);
pub const WU_E_PT_HTTP_STATUS_NOT_FOUND: i32 = hr(0x8024_4019);
pub const WU_E_PT_HTTP_STATUS_BAD_METHOD: i32 = hr(0x8024_401A);
pub const WU_E_PT_HTTP_STATUS_PROXY_AUTH_REQ: i32 = hr(0x8024_401B);
pub const WU_E_PT_HTTP_STATUS_REQUEST_TIMEOUT: i32 = hr(0x8024_401C);
pub const WU_E_PT_HTTP_STATUS_CONFLICT: i32 = hr(0x8024_401D);
pub const WU_E_PT_HTTP_STATUS_GONE: i32 = hr(0x8024_401E);
pub const WU_E_PT_HTTP_STATUS_SERVER_ERROR: i32 = hr(0x8024_401F);
pub const WU_E_PT_HTTP_STATUS_NOT_SUPPORTED: i32 = hr(0x8024_4020);
pub const WU_E_PT_HTTP_STATUS_BAD_GATEWAY: i32 = hr(0x8024_4021);
pub const WU_E_PT_HTTP_STATUS_SERVICE_UNAVAIL: i32 = hr(0x8024_4022);
pub const WU_E_PT_HTTP_STATUS_GATEWAY_TIMEOUT: i32 = hr(0x8024_4023);
pub const WU_E_PT_HTTP_STATUS_VERSION_NOT_SUP: i32 = hr(0x8024_4024);
pub const WU_E_PT_HTTP_STATUS_NOT_MAPPED: i32 = hr(0x8024_402B);
pub const WU_E_PT_WINHTTP_NAME_NOT_RESOLVED: i32 = hr(0x8024_402C);

/// Built-in messages for the update agent code space.
#[derive(Debug, Clone, Copy, Default)]
pub struct UpdateAgentMessages;

impl MessageTable for UpdateAgentMessages {
    fn lookup(&self, code: i32) -> Option<&str> {
        update_agent_message(code)
    }
}

/// Static lookup behind `UpdateAgentMessages`.
pub fn update_agent_message(code: i32) -> Option<&'static str> {
    let message = match code {
        WU_S_SERVICE_STOP => "WUA was stopped successfully.",
        WU_S_SELFUPDATE => "WUA updated itself.",
        WU_S_UPDATE_ERROR => "The operation completed successfully but errors occurred applying the updates.",
        WU_S_MARKED_FOR_DISCONNECT => "A callback was marked to be disconnected later because the request to disconnect the operation came while a callback was executing.",
        WU_S_REBOOT_REQUIRED => "The system must be restarted to complete installation of the update.",
        WU_S_ALREADY_INSTALLED => "The update to be installed is already installed on the system.",
        WU_S_ALREADY_UNINSTALLED => "The update to be removed is not installed on the system.",
        WU_S_ALREADY_DOWNLOADED => "The update to be downloaded has already been downloaded.",
        WU_S_UH_INSTALLSTILLPENDING => "The installation operation for the update is still in progress.",
        WU_E_NO_SERVICE => "WUA was unable to provide the service.",
        WU_E_MAX_CAPACITY_REACHED => "The maximum capacity of the service was exceeded.",
        WU_E_UNKNOWN_ID => "WUA cannot find an ID.",
        WU_E_NOT_INITIALIZED => "The object could not be initialized.",
        WU_E_RANGEOVERLAP => "The update handler requested a byte range overlapping a previously requested range.",
        WU_E_TOOMANYRANGES => "The requested number of byte ranges exceeds the maximum number.",
        WU_E_INVALIDINDEX => "The index to a collection was invalid.",
        WU_E_ITEMNOTFOUND => "The key for the item queried could not be found.",
        WU_E_OPERATIONINPROGRESS => "Another conflicting operation was in progress. Some operations such as installation cannot be performed twice simultaneously.",
        WU_E_COULDNOTCANCEL => "Cancellation of the operation was not allowed.",
        WU_E_CALL_CANCELLED => "Operation was cancelled.",
        WU_E_NOOP => "No operation was required.",
        WU_E_XML_MISSINGDATA => "WUA could not find required information in the update's XML data.",
        WU_E_XML_INVALID => "WUA found invalid information in the update's XML data.",
        WU_E_CYCLE_DETECTED => "Circular update relationships were detected in the metadata.",
        WU_E_TOO_DEEP_RELATION => "Update relationships too deep to evaluate were evaluated.",
        WU_E_INVALID_RELATIONSHIP => "An invalid update relationship was detected.",
        WU_E_REG_VALUE_INVALID => "An invalid registry value was read.",
        WU_E_DUPLICATE_ITEM => "Operation tried to add a duplicate item to a list.",
        WU_E_INVALID_INSTALL_REQUESTED => "Updates that are requested for install are not installable by the caller.",
        WU_E_INSTALL_NOT_ALLOWED => "Operation tried to install while another installation was in progress or the system was pending a mandatory restart.",
        WU_E_NOT_APPLICABLE => "Operation was not performed because there are no applicable updates.",
        WU_E_NO_USERTOKEN => "Operation failed because a required user token is missing.",
        WU_E_EXCLUSIVE_INSTALL_CONFLICT => "An exclusive update can't be installed with other updates at the same time.",
        WU_E_POLICY_NOT_SET => "A policy value was not set.",
        WU_E_SELFUPDATE_IN_PROGRESS => "The operation could not be performed because the Windows Update Agent is self-updating.",
        WU_E_INVALID_UPDATE => "An update contains invalid metadata.",
        WU_E_SERVICE_STOP => "Operation did not complete because the service or system was being shut down.",
        WU_E_NO_CONNECTION => "Operation did not complete because the network connection was unavailable.",
        WU_E_NO_INTERACTIVE_USER => "Operation did not complete because there is no logged-on interactive user.",
        WU_E_TIME_OUT => "Operation did not complete because it timed out.",
        WU_E_ALL_UPDATES_FAILED => "Operation failed for all the updates.",
        WU_E_EULAS_DECLINED => "The license terms for all updates were declined.",
        WU_E_NO_UPDATE => "There are no updates.",
        WU_E_USER_ACCESS_DISABLED => "Group Policy settings prevented access to Windows Update.",
        WU_E_INVALID_UPDATE_TYPE => "The type of update is invalid.",
        WU_E_URL_TOO_LONG => "The URL exceeded the maximum length.",
        WU_E_UNINSTALL_NOT_ALLOWED => "The update could not be uninstalled because the request did not originate from a WSUS server.",
        WU_E_INVALID_PRODUCT_LICENSE => "Search may have missed some updates before there is an unlicensed application on the system.",
        WU_E_MISSING_HANDLER => "A component required to detect applicable updates was missing.",
        WU_E_LEGACYSERVER => "An operation did not complete because it requires a newer version of server.",
        WU_E_BIN_SOURCE_ABSENT => "A delta-compressed update could not be installed because it required the source.",
        WU_E_SOURCE_ABSENT => "A full-file update could not be installed because it required the source.",
        WU_E_WU_DISABLED => "Access to an unmanaged server is not allowed.",
        WU_E_CALL_CANCELLED_BY_POLICY => "Operation did not complete because the DisableWindowsUpdateAccess policy was set in the registry.",
        WU_E_INVALID_PROXY_SERVER => "The format of the proxy list was invalid.",
        WU_E_INVALID_FILE => "The file is in the wrong format.",
        WU_E_INVALID_CRITERIA => "The search criteria string was invalid.",
        WU_E_EULA_UNAVAILABLE => "License terms could not be downloaded.",
        WU_E_DOWNLOAD_FAILED => "Update failed to download.",
        WU_E_UPDATE_NOT_PROCESSED => "The update was not processed.",
        WU_E_INVALID_OPERATION => "The object's current state did not allow the operation.",
        WU_E_NOT_SUPPORTED => "The functionality for the operation is not supported.",
        WU_E_TOO_MANY_RESYNC => "Agent is asked by server to resync too many times.",
        WU_E_NO_SERVER_CORE_SUPPORT => "The WUA API method does not run on the server core installation.",
        WU_E_SYSPREP_IN_PROGRESS => "Service is not available while sysprep is running.",
        WU_E_UNKNOWN_SERVICE => "The update service is no longer registered with automatic updates.",
        WU_E_NO_UI_SUPPORT => "No support for the WUA user interface.",
        WU_E_PER_MACHINE_UPDATE_ACCESS_DENIED => "Only administrators can perform this operation on per-computer updates.",
        WU_E_UNSUPPORTED_SEARCHSCOPE => "A search was attempted with a scope that is not currently supported for this type of search.",
        WU_E_BAD_FILE_URL => "The URL does not point to a file.",
        WU_E_INVALID_NOTIFICATION_INFO => "The featured update notification info returned by the server is invalid.",
        WU_E_OUTOFRANGE => "The data is out of range.",
        WU_E_SETUP_IN_PROGRESS => "WUA operations are not available while operating system setup is running.",
        WU_E_UNEXPECTED => "An operation failed due to reasons not covered by another error code.",
        WU_E_WINHTTP_INVALID_FILE => "The downloaded file has an unexpected content type.",
        WU_E_PT_HTTP_STATUS_BAD_REQUEST => "Same as HTTP status 400 - The server could not process the request due to invalid syntax.",
        WU_E_PT_HTTP_STATUS_DENIED => "Same as HTTP status 401 - The requested resource requires user authentication.",
        WU_E_PT_HTTP_STATUS_FORBIDDEN => "Same as HTTP status 403 - Server understood the request, but declines to fulfill it.",
        WU_E_PT_HTTP_STATUS_NOT_FOUND => "Same as HTTP status 404 - The server cannot find the requested URI (Uniform Resource Identifier).",
        WU_E_PT_HTTP_STATUS_BAD_METHOD => "Same as HTTP status 405 - The HTTP method is not allowed.",
        WU_E_PT_HTTP_STATUS_PROXY_AUTH_REQ => "Same as HTTP status 407 - Proxy authentication is required.",
        WU_E_PT_HTTP_STATUS_REQUEST_TIMEOUT => "Same as HTTP status 408 - The server timed out waiting for the request.",
        WU_E_PT_HTTP_STATUS_CONFLICT => "Same as HTTP status 409 - The request was not completed due to a conflict with the current state of the resource.",
        WU_E_PT_HTTP_STATUS_GONE => "Same as HTTP status 410 - Requested resource is no longer available at the server.",
        WU_E_PT_HTTP_STATUS_SERVER_ERROR => "Same as HTTP status 500 - An error internal to the server prevented fulfilling the request.",
        WU_E_PT_HTTP_STATUS_NOT_SUPPORTED => "Same as HTTP status 501 - Server does not support the functionality required to fulfill the request.",
        WU_E_PT_HTTP_STATUS_BAD_GATEWAY => "Same as HTTP status 502 - The server, while acting as a gateway or proxy, received an invalid response from the upstream server it accessed in attempting to fulfill the request.",
        WU_E_PT_HTTP_STATUS_SERVICE_UNAVAIL => "Same as HTTP status 503 - The service is temporarily overloaded.",
        WU_E_PT_HTTP_STATUS_GATEWAY_TIMEOUT => "Same as HTTP status 504 - The request was timed out waiting for a gateway.",
        WU_E_PT_HTTP_STATUS_VERSION_NOT_SUP => "Same as HTTP status 505 - The server does not support the HTTP protocol version used for the request.",
        WU_E_PT_HTTP_STATUS_NOT_MAPPED => "The request could not be completed and the reason did not correspond to any of the WU_E_PT_HTTP_* error codes.",
        WU_E_PT_WINHTTP_NAME_NOT_RESOLVED => "Same as ERROR_WINHTTP_NAME_NOT_RESOLVED - The proxy server or target server name cannot be resolved.",
        _ => return None,
    };
    Some(message)
}
