pub mod m202510010001_create_courses;
pub mod m202510010002_create_sections;
pub mod m202510010003_create_students;
pub mod m202510010004_create_users;
pub mod m202510010005_create_events;
pub mod m202510010006_create_event_course_sections;
pub mod m202510010007_create_attendance;
pub mod m202510010008_create_system_settings;
