pub mod attendance;
pub mod course;
pub mod event;
pub mod event_course_section;
pub mod section;
pub mod student;
pub mod system_settings;
pub mod user;

pub use attendance::Entity as Attendance;
pub use course::Entity as Course;
pub use event::Entity as Event;
pub use event_course_section::Entity as EventCourseSection;
pub use section::Entity as Section;
pub use student::Entity as Student;
pub use system_settings::Entity as SystemSettings;
pub use user::Entity as User;
