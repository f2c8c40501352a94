//! 规划器与参考运行时的端到端集成测试工程
