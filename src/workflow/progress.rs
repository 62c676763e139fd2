//! 进度事件分发

/// 进度接收端 - 编排器在每次阶段推进时发出 (阶段名, 完成百分比)
///
/// 消费方（CLI、Web等）被动订阅即可，核心不依赖任何具体实现。
pub trait ProgressSink: Send + Sync {
    fn emit(&self, stage: &str, percent: f32);
}

/// 空实现 - 丢弃所有进度事件
#[derive(Debug, Default, Clone)]
pub struct NullProgressSink;

impl ProgressSink for NullProgressSink {
    fn emit(&self, _stage: &str, _percent: f32) {}
}

/// 闭包适配器 - 把任意回调函数包装成进度接收端
pub struct CallbackProgressSink<F>(pub F);

impl<F> ProgressSink for CallbackProgressSink<F>
where
    F: Fn(&str, f32) + Send + Sync,
{
    fn emit(&self, stage: &str, percent: f32) {
        (self.0)(stage, percent)
    }
}
