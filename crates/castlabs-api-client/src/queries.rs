//! GraphQL documents sent to the workflow and repository APIs

pub const GET_ROOTS_OPERATION: &str = "GetRootsurn_janus_organization";
pub const GET_ROOTS: &str = r#"
query GetRootsurn_janus_organization {
    roots {
        id
        name
        __typename
    }
}"#;

pub const FOLDER_LIST_OPERATION: &str = "filefolderlistwitharchive";
pub const FOLDER_LIST: &str = r#"
query filefolderlistwitharchive($id: ID!, $show_deleted: Boolean) {
    folder(id: $id) {
        id
        name
        folders {
            id
            name
        }
        files(show_deleted: $show_deleted) {
            id
            name
            size
            last_modified
            deleted
            archived
            archive {
                restore_state
                expiration
                extra {
                    restore_tier
                    restore_eta
                }
            }
        }
    }
}"#;

pub const CREATE_UPLOAD_TICKET_OPERATION: &str = "create_upload_ticket";
pub const CREATE_UPLOAD_TICKET: &str = r#"
mutation create_upload_ticket($folder_id: ID!, $message: String!) {
    createUploadTicket(input: {
        folder_id: $folder_id, message: $message
    }) {
        directory
        token
        url
    }
}"#;

pub const START_WORKFLOW_VOD_OPERATION: &str = "start_workflow_vod_default";
pub const START_WORKFLOW_VOD: &str = r#"
mutation start_workflow_vod_default(
    $po_item_id: String!,
    $po_name: String!,
    $input_brefix: String!,
    $po_destination: String!,
    $auto_publish: Boolean!,
    $vtk_template: String!,
    $format_specific_data: AWSJSON!,
    $email_notification: [AWSEmail!]) {
    start_workflow_vod_default(
        input: {
            po_name: $po_name,
            po_item_id: $po_item_id,
            input_brefix: $input_brefix,
            po_destination: $po_destination,
            auto_publish: $auto_publish,
            email_notification: $email_notification,
            vtk_template: $vtk_template,
            format_specific_data: $format_specific_data
        }) {
        state
        message
        input
        data
        action
        id
        start_date
        end_date
        __typename
    }
}"#;

pub const GET_POS_OPERATION: &str = "GetPOs";
pub const GET_POS: &str = r#"
query GetPOs($airline: String!) {
    list_POs(input: {filter: {airline: {eq: $airline}}}) {
        pos {
            id
            airline
            po_name
            date_due
            date_created
            target_system
            __typename
        }
        __typename
    }
}"#;

pub const PO_ITEM_LIST_OPERATION: &str = "PoItemListFull";
pub const PO_ITEM_LIST: &str = r#"
query PoItemListFull($po_name: String!) {
    list_POs(input: {filter: {po_name: {eq: $po_name}}}) {
        pos {
            id
            poitems {
                input_brefix
                filename
                id
                po_item_id
                po_destination
                output_brefix
                po {
                    po_name
                }
                publish_process {
                    id
                    state
                    data
                    message
                    start_date
                    end_date
                }
                workflow_process {
                    id
                    state
                    data
                    message
                    start_date
                    end_date
                }
                watermark
                workflow
                aspect_ratio
                format_specific_data
                preview {
                    dash_manifest_last_modified
                    dash_manifest_url
                    hls_manifest_url
                    hls_manifest_last_modified
                }
                tracks {
                    codec_type
                    messages
                    source {
                        codec_type
                        index
                        key
                        lang
                    }
                    lang
                }
                checkpoint_content_uploaded
                checkpoint_content_complete
                checkpoint_encodes_done
                checkpoint_metadata_available
            }
        }
    }
}"#;

pub const GET_PROCESS_OPERATION: &str = "GetProcess";
pub const GET_PROCESS: &str = r#"
query GetProcess($id: ID!) {
    process(id: $id) {
        action
        data
        id
        message
        state
        start_date
        end_date
    }
}"#;

pub const REGISTER_WEBHOOK_OPERATION: &str = "registerWebhook";
pub const REGISTER_WEBHOOK: &str = r#"
mutation registerWebhook($input: RegisterWebhookInput!) {
    registerWebhook(input: $input) {
        id
        input
        state
        data
        message
        action
        start_date
        end_date
    }
}"#;
