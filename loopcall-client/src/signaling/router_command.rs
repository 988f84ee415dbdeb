/// Команды, поступающие в роутер от UI (кнопки, поле чата).
#[derive(Debug)]
pub enum RouterCommand {
    /// Захват медиа и создание соединения; инициатор сразу отправляет offer.
    StartSession { initiator: bool },

    /// Текст в чат другой стороне.
    Chat(String),

    /// Завершить звонок.
    Hangup,

    /// Завершить звонок и остановить цикл роутера.
    Shutdown,
}
