mod article_detail;
mod article_list;
mod course_list;
mod home;

pub use article_detail::ArticleDetailView;
pub use article_list::ArticleListView;
pub use course_list::CourseListView;
pub use home::HomeView;
