// Models module - Database entity representations

pub mod attendee_profile;
pub mod check_in_scan;
pub mod content;
pub mod discount;
pub mod event;
pub mod feedback;
pub mod merchandise;
pub mod message;
pub mod networking;
pub mod registration;
pub mod report;
pub mod session;
pub mod speaker;
pub mod sponsorship;
pub mod ticket;
pub mod ticket_type;
pub mod user;

pub use attendee_profile::AttendeeProfile;
pub use check_in_scan::CheckInScan;
pub use content::DigitalContent;
pub use discount::DiscountCode;
pub use event::{Event, EventStatus};
pub use feedback::EventFeedback;
pub use merchandise::Merchandise;
pub use message::NetworkingMessage;
pub use networking::{MatchStatus, MatchSuggestion};
pub use registration::{AttendeeMerchandise, Registration, RegistrationAttendee};
pub use report::RevenueRow;
pub use session::{EventSession, SessionBooking};
pub use speaker::Speaker;
pub use sponsorship::{BoothPackage, Exhibitor, Sponsor, SponsorTier};
pub use ticket::Ticket;
pub use ticket_type::TicketType;
pub use user::User;
