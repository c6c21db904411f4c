pub mod enums;
pub mod order;
pub mod report;
pub mod service_request;
pub mod support_request;
pub mod user;

pub use enums::{OrderStatus, Priority, RequestStatus, Role};
pub use order::{Entity as Order, Model as OrderModel};
pub use report::{Entity as Report, Model as ReportModel};
pub use service_request::{Entity as ServiceRequest, Model as ServiceRequestModel};
pub use support_request::{Entity as SupportRequest, Model as SupportRequestModel};
pub use user::{Entity as User, Model as UserModel};
